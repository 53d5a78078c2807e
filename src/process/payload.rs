//! Structured result extraction from helper-script output.
//!
//! Helper scripts print progress and diagnostics on stdout, plus exactly one
//! JSON record such as `{"success": true, "audio_path": "..."}`. The record can
//! appear anywhere in the output, so we scan for it instead of assuming it is
//! the first or last line.

use crate::error::{Result, SkriftError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Field every payload carries.
const SENTINEL: &str = "\"success\"";

/// A decoded result record.
#[derive(Debug, Clone, Deserialize)]
pub struct StructuredPayload {
    /// Whether the tool reports success.
    pub success: bool,
    /// Error detail when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
    /// Remaining result fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl StructuredPayload {
    /// Decode the result fields into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| SkriftError::MalformedOutput(format!("unexpected payload shape: {}", e)))
    }

    /// Error detail reported by the tool, or a generic one if it gave none.
    pub fn error_detail(&self) -> String {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or("tool reported failure without detail")
            .to_string()
    }
}

/// Find and decode the payload in captured stdout.
///
/// Lines are scanned first: a candidate starts with `{` and mentions the
/// `success` field. If no line qualifies, the whole text is searched for an
/// embedded record. Returns [`SkriftError::PayloadNotFound`] when there is no
/// candidate and [`SkriftError::MalformedOutput`] when candidates exist but none
/// decodes.
pub fn extract_payload(stdout: &str) -> Result<StructuredPayload> {
    let mut candidates = stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{') && line.contains(SENTINEL))
        .peekable();

    if candidates.peek().is_none() {
        let block = embedded_block(stdout).ok_or(SkriftError::PayloadNotFound)?;
        return decode_candidate(block);
    }

    let mut first_error = None;
    for candidate in candidates {
        match decode_candidate(candidate) {
            Ok(payload) => return Ok(payload),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(SkriftError::PayloadNotFound))
}

/// Locate a record embedded mid-line, e.g. after a progress prefix.
fn embedded_block(text: &str) -> Option<&str> {
    let marker = text.find(SENTINEL)?;
    let start = text[..marker].rfind('{')?;
    let end = text.rfind('}')?;
    (end > marker).then(|| text[start..=end].trim())
}

fn decode_candidate(candidate: &str) -> Result<StructuredPayload> {
    serde_json::from_str(candidate).map_err(|e| {
        SkriftError::MalformedOutput(format!("{} in {}", e, preview(candidate, 120)))
    })
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
