//! Whisper transcription through an external command.

use super::Transcriber;
use crate::config::{CommandSpec, Settings};
use crate::error::{Result, SkriftError};
use crate::process::{extract_payload, resolve_program, ProcessRunner};
use crate::request::Request;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct TranscriptRecord {
    transcript: String,
    #[serde(default)]
    length: Option<usize>,
}

/// Transcriber that runs a Whisper wrapper as a subprocess.
pub struct WhisperCommandTranscriber {
    runner: ProcessRunner,
    command: CommandSpec,
    model: String,
    use_gpu: bool,
    timeout: Duration,
}

impl WhisperCommandTranscriber {
    /// Create a transcriber with default settings.
    pub fn new(command: CommandSpec) -> Self {
        Self::with_config(command, "tiny", false, Duration::from_secs(180))
    }

    /// Create a transcriber with custom configuration.
    pub fn with_config(command: CommandSpec, model: &str, use_gpu: bool, timeout: Duration) -> Self {
        Self {
            runner: ProcessRunner::new(),
            command,
            model: model.to_string(),
            use_gpu,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let t = &settings.transcription;
        Self::with_config(t.command_spec(), &t.model, t.use_gpu, t.timeout())
    }

    /// Fail fast, without spawning, when the run cannot possibly succeed.
    fn check_preconditions(&self, audio_path: &Path) -> Result<()> {
        if !audio_path.is_file() {
            return Err(SkriftError::Transcription(format!(
                "audio file not found: {}",
                audio_path.display()
            )));
        }
        if resolve_program(&self.command.command).is_none() {
            return Err(SkriftError::Transcription(format!(
                "transcription command not found: {}",
                self.command.command
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Transcriber for WhisperCommandTranscriber {
    #[instrument(skip_all, fields(audio_path = %audio_path.display(), model = %self.model))]
    async fn transcribe(&self, audio_path: &Path, request: &Request) -> Result<String> {
        self.check_preconditions(audio_path)?;

        let mut vars = request.template_vars();
        vars.insert("audio_path", audio_path.display().to_string());
        vars.insert("model", self.model.clone());
        vars.insert("use_gpu", self.use_gpu.to_string());

        let timeout = request.budget(Some(self.timeout))?;
        info!("Transcribing audio");
        let result = self
            .runner
            .run(&self.command.command, &self.command.render_args(&vars), None, timeout)
            .await?;

        if result.timed_out {
            return Err(SkriftError::Transcription("timeout".into()));
        }

        let payload = match extract_payload(&result.stdout) {
            Ok(payload) => payload,
            Err(e) if result.success() => return Err(e),
            Err(_) => {
                return Err(SkriftError::Transcription(format!(
                    "exit code {:?}: {}",
                    result.exit_code,
                    result.stderr_tail()
                )))
            }
        };
        if !payload.success {
            return Err(SkriftError::Transcription(payload.error_detail()));
        }
        if !result.success() {
            return Err(SkriftError::Transcription(format!(
                "exit code {:?} despite success record",
                result.exit_code
            )));
        }

        let record: TranscriptRecord = payload.decode()?;
        debug!(
            chars = record.transcript.chars().count(),
            reported_length = ?record.length,
            "Transcription finished"
        );
        Ok(record.transcript)
    }
}
