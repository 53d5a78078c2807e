//! Audio download through external extraction commands.
//!
//! Commands run in the caller's working directory, so relative script paths
//! in the configuration resolve as written. The request's fresh scratch
//! directory is passed as `{{output_dir}}`. Each command must print a result
//! record: `{"success": true, "audio_path": "..."}` on success or
//! `{"success": false, "error": "..."}` on failure. Commands are tried in order
//! until one produces an audio file.

use super::{AudioArtifact, AudioDownloader};
use crate::config::{CommandSpec, Settings};
use crate::error::{Result, SkriftError};
use crate::process::{extract_payload, ProcessRunner};
use crate::request::Request;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
struct DownloadRecord {
    audio_path: PathBuf,
}

/// Downloads audio by running extraction commands such as a yt-dlp wrapper.
pub struct CommandDownloader {
    runner: ProcessRunner,
    commands: Vec<CommandSpec>,
    temp_root: PathBuf,
}

impl CommandDownloader {
    /// Create a downloader that tries `commands` in order, keeping transient
    /// files under `temp_root`.
    pub fn new(commands: Vec<CommandSpec>, temp_root: PathBuf) -> Self {
        Self {
            runner: ProcessRunner::new(),
            commands,
            temp_root,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.audio.commands(), settings.temp_dir())
    }

    /// Run one extraction command and return the audio path it reports.
    async fn run_command(&self, spec: &CommandSpec, request: &Request, scratch: &Path) -> Result<PathBuf> {
        let mut vars = request.template_vars();
        vars.insert("output_dir", scratch.display().to_string());

        let timeout = request.budget(None)?;
        let result = self
            .runner
            .run(&spec.command, &spec.render_args(&vars), None, timeout)
            .await?;

        if result.timed_out {
            return Err(SkriftError::DeadlineExceeded);
        }

        let payload = extract_payload(&result.stdout);
        if !result.success() {
            // Scripts report the reason in their record before exiting non-zero.
            let detail = match payload {
                Ok(p) if !p.success => p.error_detail(),
                _ => format!("exit code {:?}: {}", result.exit_code, result.stderr_tail()),
            };
            return Err(SkriftError::Download(detail));
        }

        let payload = payload.map_err(|e| SkriftError::Download(e.to_string()))?;
        if !payload.success {
            return Err(SkriftError::Download(payload.error_detail()));
        }
        let record: DownloadRecord = payload
            .decode()
            .map_err(|e| SkriftError::Download(e.to_string()))?;

        let path = record.audio_path;
        if !path.is_file() {
            return Err(SkriftError::Download(format!(
                "reported audio file does not exist: {}",
                path.display()
            )));
        }
        Ok(path)
    }
}

#[async_trait]
impl AudioDownloader for CommandDownloader {
    #[instrument(skip_all, fields(video_id = %request.video_id, request_id = %request.id))]
    async fn download_audio(&self, request: &Request) -> Result<AudioArtifact> {
        tokio::fs::create_dir_all(&self.temp_root).await?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", request.video_id))
            .tempdir_in(&self.temp_root)?;

        let mut last_error = None;
        for (attempt, spec) in self.commands.iter().enumerate() {
            info!("Downloading audio with {}", spec.command);
            match self.run_command(spec, request, scratch.path()).await {
                Ok(path) => {
                    info!(path = %path.display(), "Audio downloaded");
                    return Ok(AudioArtifact::with_scratch(path, scratch));
                }
                Err(SkriftError::DeadlineExceeded) => return Err(SkriftError::DeadlineExceeded),
                Err(e) => {
                    warn!(command = %spec.display(), attempt = attempt + 1, "Audio extraction failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SkriftError::Download("no extraction command configured".into())))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::video::VideoIdentifier;
    use std::time::Duration;

    fn request(budget: Option<Duration>) -> Request {
        let reference = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        Request::new(reference, VideoIdentifier::extract(reference).unwrap(), budget)
    }

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh", &["-c", script])
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_download_into_scratch_dir() {
        let root = tempfile::tempdir().unwrap();
        let downloader = CommandDownloader::new(
            vec![CommandSpec::new(
                "sh",
                &[
                    "-c",
                    r#"echo '[download] 100%'; touch "$1/audio.mp3"; echo "{\"success\": true, \"audio_path\": \"$1/audio.mp3\"}""#,
                    "sh",
                    "{{output_dir}}",
                ],
            )],
            root.path().to_path_buf(),
        );

        let artifact = downloader.download_audio(&request(None)).await.unwrap();
        assert!(artifact.path().is_file());

        let scratch = artifact.scratch_dir().unwrap().to_path_buf();
        assert!(scratch.starts_with(root.path()));
        assert!(scratch
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("dQw4w9WgXcQ-"));

        artifact.release().unwrap();
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_reference_and_output_dir_are_passed() {
        let root = tempfile::tempdir().unwrap();
        let spec = CommandSpec::new(
            "sh",
            &[
                "-c",
                r#"[ "$1" = "https://www.youtube.com/watch?v=dQw4w9WgXcQ" ] || exit 3; touch "$2/a.m4a"; echo "{\"success\": true, \"audio_path\": \"$2/a.m4a\"}""#,
                "sh",
                "{{reference}}",
                "{{output_dir}}",
            ],
        );
        let downloader = CommandDownloader::new(vec![spec], root.path().to_path_buf());

        let artifact = downloader.download_audio(&request(None)).await.unwrap();
        assert!(artifact.path().ends_with("a.m4a"));
        artifact.release().unwrap();
    }

    #[tokio::test]
    async fn test_relative_script_path_resolves_from_caller_dir() {
        let scripts = tempfile::Builder::new()
            .prefix("dl-scripts-")
            .tempdir_in(".")
            .unwrap();
        let script = PathBuf::from(scripts.path().file_name().unwrap()).join("download.sh");
        assert!(script.is_relative());
        std::fs::write(
            &script,
            r#"touch "$1/rel.mp3"; echo "{\"success\": true, \"audio_path\": \"$1/rel.mp3\"}""#,
        )
        .unwrap();

        let root = tempfile::tempdir().unwrap();
        let script_arg = script.display().to_string();
        let spec = CommandSpec::new("sh", &[script_arg.as_str(), "{{output_dir}}"]);
        let downloader = CommandDownloader::new(vec![spec], root.path().to_path_buf());

        let artifact = downloader.download_audio(&request(None)).await.unwrap();
        assert!(artifact.path().starts_with(artifact.scratch_dir().unwrap()));
        artifact.release().unwrap();
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_tool_created_temp_dir_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let downloader = CommandDownloader::new(
            vec![sh(
                r#"d=$(mktemp -d); touch "$d/audio.mp3"; echo "{\"success\": true, \"audio_path\": \"$d/audio.mp3\"}""#,
            )],
            root.path().to_path_buf(),
        );

        let artifact = downloader.download_audio(&request(None)).await.unwrap();
        let tool_dir = artifact.path().parent().unwrap().to_path_buf();
        assert!(!tool_dir.starts_with(root.path()));

        artifact.release().unwrap();
        assert!(!tool_dir.exists());
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_failure_record_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let downloader = CommandDownloader::new(
            vec![sh(r#"echo '{"success": false, "error": "Video unavailable"}'; exit 1"#)],
            root.path().to_path_buf(),
        );

        let err = downloader.download_audio(&request(None)).await.unwrap_err();
        match err {
            SkriftError::Download(detail) => assert_eq!(detail, "Video unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(entries(root.path()), 0);
    }

    #[tokio::test]
    async fn test_missing_payload_is_download_error() {
        let root = tempfile::tempdir().unwrap();
        let downloader = CommandDownloader::new(
            vec![sh("echo 'all done, no record'")],
            root.path().to_path_buf(),
        );

        let err = downloader.download_audio(&request(None)).await.unwrap_err();
        assert!(matches!(err, SkriftError::Download(_)));
    }

    #[tokio::test]
    async fn test_nonexistent_audio_path_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let downloader = CommandDownloader::new(
            vec![sh(r#"echo '{"success": true, "audio_path": "ghost.mp3"}'"#)],
            root.path().to_path_buf(),
        );

        let err = downloader.download_audio(&request(None)).await.unwrap_err();
        assert!(matches!(err, SkriftError::Download(_)));
    }

    #[tokio::test]
    async fn test_fallback_command_used_after_failure() {
        let root = tempfile::tempdir().unwrap();
        let downloader = CommandDownloader::new(
            vec![
                sh("echo 'HTTP Error 403' >&2; exit 1"),
                CommandSpec::new(
                    "sh",
                    &[
                        "-c",
                        r#"touch "$1/b.webm"; echo "{\"success\": true, \"audio_path\": \"$1/b.webm\"}""#,
                        "sh",
                        "{{output_dir}}",
                    ],
                ),
            ],
            root.path().to_path_buf(),
        );

        let artifact = downloader.download_audio(&request(None)).await.unwrap();
        assert!(artifact.path().ends_with("b.webm"));
        artifact.release().unwrap();
    }

    #[tokio::test]
    async fn test_deadline_stops_extraction() {
        let root = tempfile::tempdir().unwrap();
        let downloader = CommandDownloader::new(
            vec![sh("sleep 30"), sh("sleep 30")],
            root.path().to_path_buf(),
        );

        let started = std::time::Instant::now();
        let err = downloader
            .download_audio(&request(Some(Duration::from_millis(300))))
            .await
            .unwrap_err();

        assert!(matches!(err, SkriftError::DeadlineExceeded));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(entries(root.path()), 0);
    }
}
