//! Browser automation.
//!
//! Last resort: open the video page, reveal the transcript panel and scrape
//! the visible text. The page driver runs as an external script.

use crate::config::{CommandSpec, Settings};
use crate::error::{Result, SkriftError};
use crate::process::{extract_payload, ProcessRunner};
use crate::request::Request;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

/// Trait for browser-driven transcript scraping.
#[async_trait]
pub trait BrowserAutomation: Send + Sync {
    /// Scrape the transcript panel for the request's reference.
    async fn scrape_transcript(&self, request: &Request) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ScrapeRecord {
    transcript: String,
}

/// Browser automation backed by a headless-browser script.
///
/// The script receives the reference and prints
/// `{"success": true, "transcript": "..."}` or `{"success": false, "error": "..."}`.
pub struct CommandBrowser {
    runner: ProcessRunner,
    command: CommandSpec,
    timeout: Duration,
}

impl CommandBrowser {
    pub fn new(command: CommandSpec, timeout: Duration) -> Self {
        Self {
            runner: ProcessRunner::new(),
            command,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.browser.command_spec(), settings.browser.timeout())
    }
}

#[async_trait]
impl BrowserAutomation for CommandBrowser {
    #[instrument(skip_all, fields(video_id = %request.video_id))]
    async fn scrape_transcript(&self, request: &Request) -> Result<String> {
        let vars = request.template_vars();
        let timeout = request.budget(Some(self.timeout))?;

        info!("Scraping transcript panel");
        let result = self
            .runner
            .run(&self.command.command, &self.command.render_args(&vars), None, timeout)
            .await?;

        if result.timed_out {
            return Err(SkriftError::Browser(format!(
                "no transcript within {}s",
                timeout.unwrap_or(self.timeout).as_secs()
            )));
        }

        let payload = extract_payload(&result.stdout).map_err(|e| {
            if result.success() {
                e
            } else {
                SkriftError::Browser(format!("exit code {:?}: {}", result.exit_code, result.stderr_tail()))
            }
        })?;
        if !payload.success {
            return Err(SkriftError::Browser(payload.error_detail()));
        }

        let record: ScrapeRecord = payload.decode()?;
        Ok(record.transcript)
    }
}
