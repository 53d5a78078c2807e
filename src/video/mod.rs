//! Video reference parsing.
//!
//! Turns a user-supplied reference (a YouTube URL in one of the known shapes)
//! into a canonical [`VideoIdentifier`]. Pure, no I/O.

use regex::Regex;
use std::sync::OnceLock;

/// Canonical video identifier, always matching `[A-Za-z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoIdentifier(String);

/// Recognized URL shapes, tried in order. Each captures the identifier in group 1.
fn shapes() -> &'static [Regex] {
    static SHAPES: OnceLock<Vec<Regex>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        [
            // Watch-parameter form: youtube.com/watch?v=<id>
            r"youtube\.com/watch\?v=([A-Za-z0-9_-]+)",
            // Short-link form: youtu.be/<id>
            r"youtu\.be/([A-Za-z0-9_-]+)",
            // Embed form: youtube.com/embed/<id>
            r"youtube\.com/embed/([A-Za-z0-9_-]+)",
            r"youtube\.com/(?:v|shorts)/([A-Za-z0-9_-]+)",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("Invalid regex"))
        .collect()
    })
}

impl VideoIdentifier {
    /// Extract the identifier from a reference, or `None` if no shape matches.
    pub fn extract(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        shapes()
            .iter()
            .find_map(|shape| shape.captures(reference))
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
