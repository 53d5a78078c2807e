//! Caption lookup.
//!
//! Fetches an existing caption track for a video. This is the cheapest
//! strategy, so it is tried first.

mod timedtext;

pub use timedtext::TimedTextLookup;

use crate::error::Result;
use crate::video::VideoIdentifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A timed piece of caption text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl TranscriptFragment {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// Trait for caption lookup services.
#[async_trait]
pub trait TranscriptLookup: Send + Sync {
    /// Fetch caption fragments in playback order. Fails if the video has none.
    async fn fetch_transcript(&self, video_id: &VideoIdentifier) -> Result<Vec<TranscriptFragment>>;
}

/// Join fragment text with single spaces.
///
/// The result still needs whitespace normalization, fragments often carry their
/// own leading or trailing spaces.
pub fn join_fragments(fragments: &[TranscriptFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_fragments() {
        let fragments = vec![
            TranscriptFragment::new("Hello ", 0.0, 1.2),
            TranscriptFragment::new("world.", 1.2, 0.8),
        ];
        assert_eq!(join_fragments(&fragments), "Hello  world.");
        assert_eq!(join_fragments(&[]), "");
    }
}
