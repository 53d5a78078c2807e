//! Audio acquisition.
//!
//! Fetches a video's audio track into a request-scoped scratch directory and
//! hands it out as an [`AudioArtifact`] that deletes itself when released.

mod downloader;

pub use downloader::CommandDownloader;

use crate::error::Result;
use crate::request::Request;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Trait for audio acquisition backends.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Fetch the audio track for the request's video.
    async fn download_audio(&self, request: &Request) -> Result<AudioArtifact>;
}

/// A transient audio file owned by a single request.
///
/// Call [`AudioArtifact::release`] once the file is no longer needed. If the
/// artifact is dropped without being released (for example when the request is
/// cancelled mid-transcription) the file and its scratch directory are removed
/// on drop. Extraction tools sometimes write into a temp directory of their
/// own instead of the scratch directory; that directory is removed too once
/// it is empty.
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    scratch: Option<TempDir>,
    released: bool,
}

impl AudioArtifact {
    /// Wrap a file the caller owns outright.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            scratch: None,
            released: false,
        }
    }

    /// Wrap a file together with the scratch directory it was produced in.
    pub fn with_scratch(path: PathBuf, scratch: TempDir) -> Self {
        Self {
            path,
            scratch: Some(scratch),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scratch directory backing this artifact, if any.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Delete the audio file and its scratch directory.
    ///
    /// A file that is already gone is not an error.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        let removed = remove_if_exists(&self.path);
        self.remove_stray_parent();
        if let Some(scratch) = self.scratch.take() {
            scratch.close()?;
        }
        if removed? {
            debug!(path = %self.path.display(), "Released audio artifact");
        }
        Ok(())
    }

    /// Parent directory of a downloaded file that lies outside the scratch
    /// directory but inside the system temp directory.
    fn stray_parent(&self) -> Option<&Path> {
        let scratch = self.scratch.as_ref()?.path();
        if self.path.starts_with(scratch) {
            return None;
        }
        let parent = self.path.parent()?;
        let system_tmp = std::env::temp_dir();
        if parent == system_tmp || !parent.starts_with(&system_tmp) || scratch.starts_with(parent) {
            return None;
        }
        Some(parent)
    }

    fn remove_stray_parent(&self) {
        let Some(parent) = self.stray_parent() else {
            return;
        };
        // Fails when the tool left other files behind; those are not ours.
        match std::fs::remove_dir(parent) {
            Ok(()) => debug!(dir = %parent.display(), "Removed tool temp directory"),
            Err(e) => debug!(dir = %parent.display(), "Kept tool temp directory: {}", e),
        }
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(path = %self.path.display(), "Audio artifact dropped without release, cleaning up");
        if let Err(e) = remove_if_exists(&self.path) {
            warn!("Failed to remove audio file: {}", e);
        }
        self.remove_stray_parent();
        // The scratch TempDir removes itself when dropped.
    }
}

/// Remove a file, treating "not found" as success. Returns whether a file was removed.
fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact_in(root: &Path) -> AudioArtifact {
        let scratch = tempfile::Builder::new()
            .prefix("vid-")
            .tempdir_in(root)
            .unwrap();
        let path = scratch.path().join("audio.mp3");
        std::fs::write(&path, b"fake audio").unwrap();
        AudioArtifact::with_scratch(path, scratch)
    }

    #[test]
    fn test_release_removes_file_and_scratch() {
        let root = tempfile::tempdir().unwrap();
        let artifact = artifact_in(root.path());
        let path = artifact.path().to_path_buf();
        let scratch = artifact.scratch_dir().unwrap().to_path_buf();

        artifact.release().unwrap();

        assert!(!path.exists());
        assert!(!scratch.exists());
    }

    #[test]
    fn test_drop_without_release_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let artifact = artifact_in(root.path());
        let scratch = artifact.scratch_dir().unwrap().to_path_buf();

        drop(artifact);

        assert!(!scratch.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_release_tolerates_missing_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("never-written.mp3");
        AudioArtifact::new(path).release().unwrap();
    }

    /// A file in a directory created the way `mktemp -d` would.
    fn tool_temp_file() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tool-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir(&dir).unwrap();
        let path = dir.join("audio.mp3");
        std::fs::write(&path, b"fake audio").unwrap();
        path
    }

    #[test]
    fn test_release_removes_tool_temp_dir() {
        let root = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir_in(root.path()).unwrap();
        let path = tool_temp_file();
        let tool_dir = path.parent().unwrap().to_path_buf();

        AudioArtifact::with_scratch(path, scratch).release().unwrap();

        assert!(!tool_dir.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_drop_removes_tool_temp_dir() {
        let root = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir_in(root.path()).unwrap();
        let path = tool_temp_file();
        let tool_dir = path.parent().unwrap().to_path_buf();

        drop(AudioArtifact::with_scratch(path, scratch));

        assert!(!tool_dir.exists());
    }

    #[test]
    fn test_tool_temp_dir_with_leftovers_is_kept() {
        let root = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir_in(root.path()).unwrap();
        let path = tool_temp_file();
        let tool_dir = path.parent().unwrap().to_path_buf();
        std::fs::write(tool_dir.join("audio.part"), b"x").unwrap();

        AudioArtifact::with_scratch(path.clone(), scratch).release().unwrap();

        assert!(!path.exists());
        assert!(tool_dir.join("audio.part").exists());
        std::fs::remove_dir_all(&tool_dir).unwrap();
    }

    #[test]
    fn test_release_outside_scratch() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("elsewhere.m4a");
        std::fs::write(&path, b"x").unwrap();

        AudioArtifact::new(path.clone()).release().unwrap();
        assert!(!path.exists());
    }
}
