//! Transcript acquisition strategies.
//!
//! A strategy is one self-contained way of getting a transcript. The
//! orchestrator tries them in a fixed order and judges each result with
//! [`AcquisitionOutcome::judge`].

use crate::audio::AudioDownloader;
use crate::browser::BrowserAutomation;
use crate::error::Result;
use crate::lookup::{join_fragments, TranscriptLookup};
use crate::request::Request;
use crate::transcription::Transcriber;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of one strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    /// Normalized transcript that passed the quality floor.
    Success(String),
    /// Why the attempt did not produce a usable transcript.
    Failure(String),
}

impl AcquisitionOutcome {
    /// Normalize raw strategy output and apply the quality floor.
    pub fn judge(raw: &str, min_chars: usize) -> Self {
        let text = normalize_whitespace(raw);
        let chars = text.chars().count();
        if chars == 0 {
            Self::Failure("empty transcript".into())
        } else if chars < min_chars {
            Self::Failure(format!(
                "transcript too short ({} < {} characters)",
                chars, min_chars
            ))
        } else {
            Self::Success(text)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Collapse whitespace runs to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One way of acquiring a transcript.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Produce raw transcript text for the request.
    async fn execute(&self, request: &Request) -> Result<String>;
}

/// Fetch an existing caption track.
pub struct LookupStrategy {
    lookup: Arc<dyn TranscriptLookup>,
}

impl LookupStrategy {
    pub fn new(lookup: Arc<dyn TranscriptLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Strategy for LookupStrategy {
    fn name(&self) -> &str {
        "lookup"
    }

    async fn execute(&self, request: &Request) -> Result<String> {
        let fragments = self.lookup.fetch_transcript(&request.video_id).await?;
        debug!(count = fragments.len(), "Caption fragments received");
        Ok(join_fragments(&fragments))
    }
}

/// Download the audio track and run speech-to-text on it.
pub struct AudioPipelineStrategy {
    downloader: Arc<dyn AudioDownloader>,
    transcriber: Arc<dyn Transcriber>,
}

impl AudioPipelineStrategy {
    pub fn new(downloader: Arc<dyn AudioDownloader>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            downloader,
            transcriber,
        }
    }
}

#[async_trait]
impl Strategy for AudioPipelineStrategy {
    fn name(&self) -> &str {
        "audio"
    }

    async fn execute(&self, request: &Request) -> Result<String> {
        let artifact = self.downloader.download_audio(request).await?;
        let transcript = self.transcriber.transcribe(artifact.path(), request).await;

        // Released on every path; a cancelled future drops the artifact instead.
        if let Err(e) = artifact.release() {
            warn!("Failed to clean up audio artifact: {}", e);
        }
        transcript
    }
}

/// Scrape the on-page transcript panel.
pub struct BrowserStrategy {
    browser: Arc<dyn BrowserAutomation>,
}

impl BrowserStrategy {
    pub fn new(browser: Arc<dyn BrowserAutomation>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl Strategy for BrowserStrategy {
    fn name(&self) -> &str {
        "browser"
    }

    async fn execute(&self, request: &Request) -> Result<String> {
        self.browser.scrape_transcript(request).await
    }
}
