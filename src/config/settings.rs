//! Configuration settings for Skrift.

use super::CommandSpec;
use crate::error::{Result, SkriftError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub chain: ChainSettings,
    pub lookup: LookupSettings,
    pub audio: AudioSettings,
    pub transcription: TranscriptionSettings,
    pub browser: BrowserSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for transient audio artifacts.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/skrift".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Acquisition strategy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Caption lookup through the timed-text API.
    Lookup,
    /// Audio download followed by speech-to-text.
    Audio,
    /// Browser automation scraping the transcript panel.
    Browser,
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lookup" | "api" => Ok(StrategyKind::Lookup),
            "audio" | "whisper" => Ok(StrategyKind::Audio),
            "browser" => Ok(StrategyKind::Browser),
            _ => Err(format!("Unknown strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Lookup => write!(f, "lookup"),
            StrategyKind::Audio => write!(f, "audio"),
            StrategyKind::Browser => write!(f, "browser"),
        }
    }
}

/// Strategy chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Enabled strategies. Always evaluated in lookup, audio, browser order.
    pub strategies: Vec<StrategyKind>,
    /// Transcripts shorter than this (after whitespace normalization) are rejected.
    pub min_transcript_chars: usize,
    /// Overall budget for a single request, shared by all strategies.
    pub request_timeout_seconds: Option<u64>,
    /// Maximum requests processed at once in batch mode.
    pub max_concurrent_requests: usize,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            strategies: vec![StrategyKind::Lookup, StrategyKind::Audio, StrategyKind::Browser],
            min_transcript_chars: 100,
            request_timeout_seconds: None,
            max_concurrent_requests: 4,
        }
    }
}

impl ChainSettings {
    /// Enabled strategies in canonical order, without duplicates.
    pub fn ordered_strategies(&self) -> Vec<StrategyKind> {
        let mut kinds = self.strategies.clone();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }
}

/// Caption lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    /// Base URL of the timed-text service.
    pub base_url: String,
    /// Caption languages to try, in order.
    pub languages: Vec<String>,
    /// HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            languages: vec!["en".to_string()],
            timeout_seconds: 30,
        }
    }
}

/// Audio extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Primary extraction program.
    pub command: String,
    /// Argument templates for the primary program.
    pub args: Vec<String>,
    /// Commands tried in order when the primary one fails.
    pub fallback_commands: Vec<CommandSpec>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: vec!["scripts/download_audio.py".to_string(), "{{reference}}".to_string()],
            fallback_commands: Vec::new(),
        }
    }
}

impl AudioSettings {
    /// Primary command followed by the fallbacks.
    pub fn commands(&self) -> Vec<CommandSpec> {
        let primary = CommandSpec {
            command: self.command.clone(),
            args: self.args.clone(),
        };
        std::iter::once(primary)
            .chain(self.fallback_commands.iter().cloned())
            .collect()
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub command: String,
    pub args: Vec<String>,
    /// Model tier passed to the transcription command.
    pub model: String,
    /// Whether to ask the transcription command for GPU acceleration.
    pub use_gpu: bool,
    /// Hard limit for a single transcription run.
    pub timeout_seconds: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: vec![
                "scripts/transcribe_audio.py".to_string(),
                "{{audio_path}}".to_string(),
                "{{use_gpu}}".to_string(),
                "{{model}}".to_string(),
            ],
            model: "tiny".to_string(),
            use_gpu: false,
            timeout_seconds: 180, // 3 minutes
        }
    }
}

impl TranscriptionSettings {
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            command: self.command.clone(),
            args: self.args.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub command: String,
    pub args: Vec<String>,
    /// Wait budget for page load, panel reveal and extraction.
    pub timeout_seconds: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec![
                "scripts/browser_transcript.js".to_string(),
                "{{reference}}".to_string(),
            ],
            timeout_seconds: 45,
        }
    }
}

impl BrowserSettings {
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            command: self.command.clone(),
            args: self.args.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SkriftError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that cannot drive the chain.
    pub fn validate(&self) -> Result<()> {
        if self.chain.ordered_strategies().is_empty() {
            return Err(SkriftError::Config("at least one strategy must be enabled".into()));
        }
        if self.chain.max_concurrent_requests == 0 {
            return Err(SkriftError::Config("chain.max_concurrent_requests must be > 0".into()));
        }
        if self.chain.request_timeout_seconds == Some(0) {
            return Err(SkriftError::Config("chain.request_timeout_seconds must be > 0".into()));
        }

        let commands = self
            .audio
            .commands()
            .into_iter()
            .chain([self.transcription.command_spec(), self.browser.command_spec()]);
        for spec in commands {
            if spec.command.trim().is_empty() {
                return Err(SkriftError::Config("command must not be empty".into()));
            }
        }

        if self.transcription.timeout_seconds == 0
            || self.browser.timeout_seconds == 0
            || self.lookup.timeout_seconds == 0
        {
            return Err(SkriftError::Config("timeouts must be > 0".into()));
        }
        if self.lookup.languages.is_empty() {
            return Err(SkriftError::Config("lookup.languages must not be empty".into()));
        }

        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skrift")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}
