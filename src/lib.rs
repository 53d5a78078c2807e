//! Skrift - transcript acquisition with automatic fallback
//!
//! Gets a text transcript for a YouTube video by trying several acquisition
//! strategies in a fixed order and falling back when one fails.
//!
//! The name "Skrift" is Norwegian for "writing."
//!
//! # Strategies
//!
//! 1. **Lookup** - fetch an existing caption track over HTTP.
//! 2. **Audio** - download the audio track with an external extraction command,
//!    run an external speech-to-text command on it, then delete the audio.
//! 3. **Browser** - scrape the on-page transcript panel with an automation script.
//!
//! A transcript shorter than the configured quality floor counts as a failure.
//! When every strategy fails the caller gets a fixed guidance message instead of
//! an error. Only an unrecognized video reference is reported as an error.
//!
//! # Architecture
//!
//! - `video` - Video reference parsing
//! - `process` - Subprocess runner and result-record extraction
//! - `audio` - Audio download into request-scoped scratch space
//! - `transcription` - Speech-to-text
//! - `lookup` - Caption lookup
//! - `browser` - Browser automation
//! - `strategy` - Strategy trait and the three built-in strategies
//! - `orchestrator` - The fallback chain
//!
//! # Example
//!
//! ```rust,no_run
//! use skrift::config::Settings;
//! use skrift::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let text = orchestrator
//!         .acquire_transcript("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await?;
//!     println!("{}", text);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod lookup;
pub mod orchestrator;
pub mod process;
pub mod request;
pub mod strategy;
pub mod transcription;
pub mod video;

pub use error::{Result, SkriftError};
