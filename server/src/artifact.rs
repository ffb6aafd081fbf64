//! Transient on-disk copy of a streamed utterance.
//!
//! Every streaming request owns exactly one artifact. Names carry a
//! random request id so concurrent requests never share a file.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug)]
pub struct TransientArtifact {
    id: Uuid,
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl TransientArtifact {
    /// Create an empty artifact file under `dir`.
    pub async fn create(dir: &Path, extension: &str) -> io::Result<Self> {
        fs::create_dir_all(dir).await?;
        let id = Uuid::new_v4();
        let path = dir.join(format!("tts_{id}.{extension}"));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        debug!(path = %path.display(), "Created audio artifact");
        Ok(Self {
            id,
            path,
            file: Some(file),
            written: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Whether the artifact still accepts writes.
    pub fn is_writable(&self) -> bool {
        self.file.is_some()
    }

    /// Append a chunk. The first failure is logged and disables further
    /// writes; the caller's stream carries on without the copy.
    pub async fn write_chunk(&mut self, chunk: &[u8]) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        match file.write_all(chunk).await {
            Ok(()) => self.written += chunk.len() as u64,
            Err(e) => {
                warn!(path = %self.path.display(), "Artifact write failed, dropping copy: {e}");
                self.file = None;
            }
        }
    }

    /// Swap the handle for a read-only one so the next writes fail.
    #[cfg(test)]
    pub(crate) async fn reopen_read_only(&mut self) -> io::Result<()> {
        self.file = Some(File::open(&self.path).await?);
        Ok(())
    }

    /// Flush and close the file. Writes after this are ignored.
    pub async fn finish(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush().await {
                warn!(path = %self.path.display(), "Artifact flush failed: {e}");
            }
        }
    }
}

/// Best-effort removal; failures are logged and reported as `false`.
pub async fn remove_artifact(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Temp file deleted");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), "Error deleting temp file: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tts-relay-artifact-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_write_and_finish() {
        let dir = scratch_dir();
        let mut artifact = TransientArtifact::create(&dir, "mp3").await.unwrap();
        assert!(artifact.path().exists());
        assert!(artifact
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(".mp3"));

        artifact.write_chunk(b"abc").await;
        artifact.write_chunk(b"def").await;
        artifact.finish().await;
        assert!(!artifact.is_writable());
        assert_eq!(artifact.bytes_written(), 6);
        assert_eq!(fs::read(artifact.path()).await.unwrap(), b"abcdef");

        // ignored once finished
        artifact.write_chunk(b"ghi").await;
        assert_eq!(artifact.bytes_written(), 6);

        assert!(remove_artifact(artifact.path()).await);
        assert!(!artifact.path().exists());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_write_failure_disables_further_writes() {
        let dir = scratch_dir();
        let mut artifact = TransientArtifact::create(&dir, "mp3").await.unwrap();
        artifact.reopen_read_only().await.unwrap();

        for _ in 0..3 {
            artifact.write_chunk(b"abc").await;
        }
        assert!(!artifact.is_writable());
        assert!(artifact.bytes_written() < 9);

        artifact.finish().await;
        assert!(fs::read(artifact.path()).await.unwrap().is_empty());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_names_never_collide() {
        let dir = scratch_dir();
        let a = TransientArtifact::create(&dir, "mp3").await.unwrap();
        let b = TransientArtifact::create(&dir, "mp3").await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.path(), b.path());
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_removing_missing_file_reports_failure() {
        let path = scratch_dir().join("missing.mp3");
        assert!(!remove_artifact(&path).await);
    }
}
