//! Speech-to-text for downloaded audio.
//!
//! Transcription runs in an external process (a Whisper wrapper script by
//! default) that prints a result record such as
//! `{"success": true, "transcript": "...", "length": 1234}`.

mod whisper;

pub use whisper::WhisperCommandTranscriber;

use crate::error::Result;
use crate::request::Request;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return the transcript text.
    async fn transcribe(&self, audio_path: &Path, request: &Request) -> Result<String>;
}
