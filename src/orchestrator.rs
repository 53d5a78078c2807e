//! Strategy chain orchestrator for Skrift.
//!
//! Resolves the video reference, then tries each enabled strategy in order
//! until one yields a transcript that clears the quality floor.

use crate::audio::CommandDownloader;
use crate::browser::CommandBrowser;
use crate::config::{Settings, StrategyKind};
use crate::error::{Result, SkriftError};
use crate::lookup::TimedTextLookup;
use crate::request::Request;
use crate::strategy::{
    AcquisitionOutcome, AudioPipelineStrategy, BrowserStrategy, LookupStrategy, Strategy,
};
use crate::transcription::WhisperCommandTranscriber;
use crate::video::VideoIdentifier;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Returned in place of a transcript when every strategy failed.
pub const UNAVAILABLE_MESSAGE: &str = "TRANSCRIPT NOT AVAILABLE

We cannot get the transcript for this video.

WHAT TO DO:
🎬 Choose a video with captions enabled
📝 Look for videos that show \"CC\" (closed captions) button
🔍 Try educational channels that typically have transcripts

RECOMMENDATION:
Please try a different video that has captions enabled.";

/// The main orchestrator for the acquisition chain.
pub struct Orchestrator {
    settings: Settings,
    strategies: Vec<Arc<dyn Strategy>>,
}

impl Orchestrator {
    /// Create an orchestrator with the strategies enabled in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let mut strategies: Vec<Arc<dyn Strategy>> = Vec::new();
        for kind in settings.chain.ordered_strategies() {
            let strategy: Arc<dyn Strategy> = match kind {
                StrategyKind::Lookup => Arc::new(LookupStrategy::new(Arc::new(
                    TimedTextLookup::from_settings(&settings)?,
                ))),
                StrategyKind::Audio => Arc::new(AudioPipelineStrategy::new(
                    Arc::new(CommandDownloader::from_settings(&settings)),
                    Arc::new(WhisperCommandTranscriber::from_settings(&settings)),
                )),
                StrategyKind::Browser => {
                    Arc::new(BrowserStrategy::new(Arc::new(CommandBrowser::from_settings(&settings))))
                }
            };
            strategies.push(strategy);
        }
        info!(
            "Strategy chain: {}",
            strategies.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
        );

        Ok(Self { settings, strategies })
    }

    /// Create an orchestrator with custom strategies, tried in the given order.
    pub fn with_strategies(settings: Settings, strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self { settings, strategies }
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Names of the strategies in evaluation order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Acquire a transcript and report how it went.
    ///
    /// Only an unrecognized reference is an error. Strategy failures are
    /// collected in [`Acquisition::failures`].
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn acquire(&self, reference: &str) -> Result<Acquisition> {
        let video_id = VideoIdentifier::extract(reference)
            .ok_or_else(|| SkriftError::InvalidReference(reference.to_string()))?;
        let request = Request::new(reference, video_id, self.settings.chain.request_timeout());
        info!(video_id = %request.video_id, request_id = %request.id, "Acquiring transcript");

        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let name = strategy.name();
            info!(strategy = name, "Trying strategy");

            match self.attempt(strategy.as_ref(), &request).await? {
                AcquisitionOutcome::Success(transcript) => {
                    info!(strategy = name, chars = transcript.chars().count(), "Transcript acquired");
                    return Ok(Acquisition {
                        video_id: request.video_id,
                        transcript: Some(transcript),
                        strategy: Some(name.to_string()),
                        failures,
                    });
                }
                AcquisitionOutcome::Failure(reason) => {
                    warn!(strategy = name, reason = %reason, "Strategy failed");
                    failures.push(StrategyFailure {
                        strategy: name.to_string(),
                        reason,
                    });
                }
            }
        }

        warn!(video_id = %request.video_id, "All strategies failed");
        Ok(Acquisition {
            video_id: request.video_id,
            transcript: None,
            strategy: None,
            failures,
        })
    }

    /// Acquire a transcript as plain text, or the guidance message if none
    /// could be obtained.
    pub async fn acquire_transcript(&self, reference: &str) -> Result<String> {
        Ok(self.acquire(reference).await?.into_text())
    }

    /// Acquire transcripts for many references concurrently.
    ///
    /// Results are returned in input order. Each request still runs its own
    /// strategies one at a time.
    pub async fn acquire_batch<S: AsRef<str>>(&self, references: &[S]) -> Vec<Result<Acquisition>> {
        let limit = self.settings.chain.max_concurrent_requests.max(1);

        let mut results: Vec<(usize, Result<Acquisition>)> = stream::iter(references.iter().enumerate())
            .map(|(idx, reference)| async move { (idx, self.acquire(reference.as_ref()).await) })
            .buffer_unordered(limit)
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Run one strategy within the remaining request budget and judge its output.
    async fn attempt(&self, strategy: &dyn Strategy, request: &Request) -> Result<AcquisitionOutcome> {
        let raw = match request.remaining() {
            Some(left) if left.is_zero() => Err(SkriftError::DeadlineExceeded),
            Some(left) => tokio::time::timeout(left, strategy.execute(request))
                .await
                .unwrap_or(Err(SkriftError::DeadlineExceeded)),
            None => strategy.execute(request).await,
        };

        match raw {
            Ok(text) => Ok(AcquisitionOutcome::judge(
                &text,
                self.settings.chain.min_transcript_chars,
            )),
            Err(e) if e.is_terminal() => Err(e),
            Err(e) => Ok(AcquisitionOutcome::Failure(e.to_string())),
        }
    }
}

/// A strategy that did not produce a transcript, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

/// Result of acquiring a transcript for one reference.
#[derive(Debug, Clone)]
pub struct Acquisition {
    /// Identifier the reference resolved to.
    pub video_id: VideoIdentifier,
    /// Normalized transcript, if any strategy succeeded.
    pub transcript: Option<String>,
    /// Name of the strategy that succeeded.
    pub strategy: Option<String>,
    /// Strategies that failed before the successful one (or all of them).
    pub failures: Vec<StrategyFailure>,
}

impl Acquisition {
    pub fn is_success(&self) -> bool {
        self.transcript.is_some()
    }

    /// Transcript text, or [`UNAVAILABLE_MESSAGE`].
    pub fn into_text(self) -> String {
        self.transcript
            .unwrap_or_else(|| UNAVAILABLE_MESSAGE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    fn long_text() -> String {
        "this sentence is long enough to count ".repeat(4)
    }

    struct Scripted {
        name: &'static str,
        reply: Option<String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(name: &'static str, text: &str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: Some(text.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: None,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(name: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply: Some(long_text()),
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Strategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn execute(&self, _: &Request) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply
                .clone()
                .ok_or_else(|| SkriftError::Strategy(format!("{} unavailable", self.name)))
        }
    }

    fn orchestrator(strategies: Vec<Arc<dyn Strategy>>) -> Orchestrator {
        Orchestrator::with_strategies(Settings::default(), strategies)
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let (a, b, c) = (
            Scripted::ok("lookup", &long_text()),
            Scripted::ok("audio", &long_text()),
            Scripted::ok("browser", &long_text()),
        );
        let orch = orchestrator(vec![a.clone(), b.clone(), c.clone()]);

        let acquisition = orch.acquire(URL).await.unwrap();
        assert_eq!(acquisition.strategy.as_deref(), Some("lookup"));
        assert!(acquisition.failures.is_empty());
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_falls_through_in_order() {
        let (a, b, c) = (
            Scripted::failing("lookup"),
            Scripted::failing("audio"),
            Scripted::ok("browser", &long_text()),
        );
        let orch = orchestrator(vec![a.clone(), b.clone(), c.clone()]);

        let acquisition = orch.acquire(URL).await.unwrap();
        assert_eq!(acquisition.strategy.as_deref(), Some("browser"));
        let failed: Vec<_> = acquisition.failures.iter().map(|f| f.strategy.as_str()).collect();
        assert_eq!(failed, vec!["lookup", "audio"]);
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_short_transcript_is_a_failure() {
        let (a, b) = (Scripted::ok("lookup", "Hi."), Scripted::ok("audio", &long_text()));
        let orch = orchestrator(vec![a.clone(), b.clone()]);

        let acquisition = orch.acquire(URL).await.unwrap();
        assert_eq!(acquisition.strategy.as_deref(), Some("audio"));
        assert!(acquisition.failures[0].reason.contains("too short"));
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_transcript_is_normalized() {
        let raw = format!("  {}\n\n  end  ", long_text());
        let orch = orchestrator(vec![Scripted::ok("lookup", &raw)]);

        let text = orch.acquire_transcript(URL).await.unwrap();
        assert!(!text.contains("  "));
        assert!(text.ends_with("count end"));
    }

    #[tokio::test]
    async fn test_all_failed_yields_guidance() {
        let orch = orchestrator(vec![Scripted::failing("lookup"), Scripted::failing("browser")]);

        let acquisition = orch.acquire(URL).await.unwrap();
        assert!(!acquisition.is_success());
        assert_eq!(acquisition.failures.len(), 2);
        assert_eq!(acquisition.into_text(), UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_invalid_reference_runs_nothing() {
        let a = Scripted::ok("lookup", &long_text());
        let orch = orchestrator(vec![a.clone()]);

        let err = orch.acquire_transcript("https://example.com/video").await.unwrap_err();
        assert!(matches!(err, SkriftError::InvalidReference(_)));
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_moves_on_and_exhausts() {
        let mut settings = Settings::default();
        settings.chain.request_timeout_seconds = Some(5);
        let (a, b) = (
            Scripted::slow("lookup", Duration::from_secs(60)),
            Scripted::ok("audio", &long_text()),
        );
        let orch = Orchestrator::with_strategies(settings, vec![a.clone(), b.clone()]);

        let acquisition = orch.acquire(URL).await.unwrap();
        assert!(!acquisition.is_success());
        assert_eq!(a.calls(), 1);
        // Budget is spent, so the next strategy fails without running.
        assert_eq!(b.calls(), 0);
        assert!(acquisition
            .failures
            .iter()
            .all(|f| f.reason == SkriftError::DeadlineExceeded.to_string()));
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let orch = orchestrator(vec![Scripted::ok("lookup", &long_text())]);
        let refs = [URL, "not a url", "https://youtu.be/abc123XYZ"];

        let results = orch.acquire_batch(&refs).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().video_id.as_str(), "dQw4w9WgXcQ");
        assert!(matches!(results[1], Err(SkriftError::InvalidReference(_))));
        assert_eq!(results[2].as_ref().unwrap().video_id.as_str(), "abc123XYZ");
    }

    #[tokio::test]
    async fn test_default_chain_order() {
        let orch = Orchestrator::new(Settings::default()).unwrap();
        assert_eq!(orch.strategy_names(), vec!["lookup", "audio", "browser"]);
    }
}
