//! Error types for Skrift.

use thiserror::Error;

/// Library-level error type for Skrift operations.
#[derive(Error, Debug)]
pub enum SkriftError {
    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    #[error("Failed to launch {program}: {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("No structured payload found in tool output")]
    PayloadNotFound,

    #[error("Malformed tool output: {0}")]
    MalformedOutput(String),

    #[error("Audio download failed: {0}")]
    Download(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcript lookup failed: {0}")]
    Lookup(String),

    #[error("Browser automation failed: {0}")]
    Browser(String),

    #[error("Strategy failed: {0}")]
    Strategy(String),

    #[error("Request deadline exceeded")]
    DeadlineExceeded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SkriftError {
    /// Whether this error must abort the whole request instead of advancing
    /// to the next strategy.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SkriftError::InvalidReference(_))
    }
}

/// Result type alias for Skrift operations.
pub type Result<T> = std::result::Result<T, SkriftError>;
