//! Timed-text HTTP client.

use super::{TranscriptFragment, TranscriptLookup};
use crate::config::Settings;
use crate::error::{Result, SkriftError};
use crate::video::VideoIdentifier;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

#[derive(Debug, Deserialize)]
struct Json3Track {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Caption lookup against the `/api/timedtext` endpoint in `json3` format.
pub struct TimedTextLookup {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
}

impl TimedTextLookup {
    pub fn new(base_url: &str, languages: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skrift/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            languages,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let lookup = &settings.lookup;
        Self::new(
            &lookup.base_url,
            lookup.languages.clone(),
            Duration::from_secs(lookup.timeout_seconds),
        )
    }

    async fn fetch_language(&self, video_id: &VideoIdentifier, lang: &str) -> Result<Vec<TranscriptFragment>> {
        let url = format!("{}/api/timedtext", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("v", video_id.as_str()), ("lang", lang), ("fmt", "json3")])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(SkriftError::Lookup(format!("no '{}' captions", lang)));
        }
        parse_json3(&body)
    }
}

#[async_trait]
impl TranscriptLookup for TimedTextLookup {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn fetch_transcript(&self, video_id: &VideoIdentifier) -> Result<Vec<TranscriptFragment>> {
        let mut last_error = None;
        for lang in &self.languages {
            match self.fetch_language(video_id, lang).await {
                Ok(fragments) if !fragments.is_empty() => {
                    debug!(lang = %lang, count = fragments.len(), "Caption track found");
                    return Ok(fragments);
                }
                Ok(_) => {
                    last_error = Some(SkriftError::Lookup(format!("'{}' caption track is empty", lang)));
                }
                Err(e) => {
                    warn!(lang = %lang, "Caption lookup failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SkriftError::Lookup("no caption languages configured".into())))
    }
}

/// Parse a `json3` caption document into fragments, skipping events without text.
pub(crate) fn parse_json3(body: &str) -> Result<Vec<TranscriptFragment>> {
    let track: Json3Track = serde_json::from_str(body)
        .map_err(|e| SkriftError::Lookup(format!("unreadable caption track: {}", e)))?;

    let fragments = track
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.replace('\n', " ");
            (!text.trim().is_empty()).then(|| {
                TranscriptFragment::new(
                    text,
                    event.t_start_ms as f64 / 1000.0,
                    event.d_duration_ms as f64 / 1000.0,
                )
            })
        })
        .collect();

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TRACK: &str = r#"{
        "wireMagic": "pb3",
        "events": [
            {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Hello "}, {"utf8": "there"}]},
            {"tStartMs": 1500, "dDurationMs": 10, "aAppend": 1, "segs": [{"utf8": "\n"}]},
            {"tStartMs": 1510},
            {"tStartMs": 2000, "dDurationMs": 900, "segs": [{"utf8": "world."}]}
        ]
    }"#;

    #[test]
    fn test_parse_json3() {
        let fragments = parse_json3(TRACK).unwrap();
        assert_eq!(
            fragments,
            vec![
                TranscriptFragment::new("Hello there", 0.0, 1.5),
                TranscriptFragment::new("world.", 2.0, 0.9),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_json3("<html>"), Err(SkriftError::Lookup(_))));
        assert!(parse_json3("{}").unwrap().is_empty());
    }

    /// Serve `responses` in order, one per connection.
    async fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
            }
        });
        format!("http://{}", addr)
    }

    fn video() -> VideoIdentifier {
        VideoIdentifier::extract("https://youtu.be/abc123XYZ").unwrap()
    }

    #[tokio::test]
    async fn test_falls_back_to_next_language() {
        let base = serve(vec![(200, ""), (200, TRACK)]).await;
        let lookup = TimedTextLookup::new(
            &base,
            vec!["nb".into(), "en".into()],
            Duration::from_secs(5),
        )
        .unwrap();

        let fragments = lookup.fetch_transcript(&video()).await.unwrap();
        assert_eq!(fragments.len(), 2);
    }

    #[tokio::test]
    async fn test_http_error_is_failure() {
        let base = serve(vec![(404, "")]).await;
        let lookup = TimedTextLookup::new(&base, vec!["en".into()], Duration::from_secs(5)).unwrap();

        assert!(matches!(
            lookup.fetch_transcript(&video()).await,
            Err(SkriftError::Http(_))
        ));
    }
}
