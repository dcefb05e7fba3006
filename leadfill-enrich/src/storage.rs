//! Enriched output files
//!
//! Files live in the configured output directory until they are downloaded
//! or expire. A [`TempOutput`] guard owns a file for the duration of a
//! download response and removes it when dropped, whether the body was fully
//! sent, the client disconnected, or the handler bailed out early. Files
//! nobody downloads are swept once older than the store's TTL.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

const FILE_PREFIX: &str = "enriched_";
const FILE_SUFFIX: &str = ".csv";

/// Directory of enriched files awaiting download
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
    ttl: Duration,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if missing
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Write `contents` under a fresh name; returns the file name
    pub async fn save(&self, contents: &[u8]) -> std::io::Result<String> {
        self.ensure_dir().await?;
        if let Err(e) = self.sweep_expired().await {
            warn!(dir = %self.dir.display(), error = %e, "Output sweep failed");
        }
        let name = format!("{}{}{}", FILE_PREFIX, Uuid::new_v4().simple(), FILE_SUFFIX);
        tokio::fs::write(self.dir.join(&name), contents).await?;
        debug!(file = %name, bytes = contents.len(), "Enriched output stored");
        Ok(name)
    }

    /// Remove stored outputs last modified more than the TTL ago
    ///
    /// Only names produced by [`OutputStore::save`] are considered. Returns
    /// the number of files removed.
    pub async fn sweep_expired(&self) -> std::io::Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            if !file_name.to_str().is_some_and(is_output_name) {
                continue;
            }
            let Ok(modified) = entry.metadata().await.and_then(|m| m.modified()) else {
                continue;
            };
            if now.duration_since(modified).unwrap_or_default() <= self.ttl {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(file = %entry.path().display(), error = %e, "Failed to remove expired output"),
            }
        }

        if removed > 0 {
            info!(removed, "Expired enriched outputs removed");
        }
        Ok(removed)
    }

    /// Claim a stored file for download
    ///
    /// Only names produced by [`OutputStore::save`] are accepted; anything
    /// else, including path traversal attempts, is treated as absent.
    pub async fn open(&self, name: &str) -> Option<(tokio::fs::File, TempOutput)> {
        if !is_output_name(name) {
            return None;
        }
        let path = self.dir.join(name);
        let file = tokio::fs::File::open(&path).await.ok()?;
        Some((file, TempOutput { path }))
    }
}

/// Name shape produced by [`OutputStore::save`]: `enriched_<32 hex>.csv`
fn is_output_name(name: &str) -> bool {
    name.strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
        .is_some_and(|id| id.len() == 32 && id.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Deletes its file when dropped
#[derive(Debug)]
pub struct TempOutput {
    path: PathBuf,
}

impl TempOutput {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(file = %self.path.display(), "Enriched output removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(file = %self.path.display(), error = %e, "Failed to remove enriched output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn backdate(path: &Path, by: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - by).unwrap();
    }

    #[test]
    fn test_output_name_validation() {
        assert!(is_output_name("enriched_0123456789abcdef0123456789abcdef.csv"));
        assert!(!is_output_name("enriched_../../etc/passwd.csv"));
        assert!(!is_output_name("../enriched_0123456789abcdef0123456789abcdef.csv"));
        assert!(!is_output_name("notes.csv"));
        assert!(!is_output_name("enriched_abc.csv"));
    }

    #[tokio::test]
    async fn test_save_open_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path().join("out"), HOUR);

        let name = store.save(b"a,b\n").await.unwrap();
        let path = store.dir().join(&name);
        assert!(path.exists());

        let (_file, guard) = store.open(&name).await.unwrap();
        assert_eq!(guard.path(), path);
        drop(guard);
        assert!(!path.exists());

        assert!(store.open(&name).await.is_none());
    }

    #[tokio::test]
    async fn test_open_unknown_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path(), HOUR);
        assert!(store
            .open("enriched_0123456789abcdef0123456789abcdef.csv")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path(), HOUR);

        let stale = store.save(b"old").await.unwrap();
        let fresh = store.save(b"new").await.unwrap();
        backdate(&dir.path().join(&stale), 2 * HOUR);

        let foreign = dir.path().join("notes.csv");
        std::fs::write(&foreign, b"keep").unwrap();
        backdate(&foreign, 2 * HOUR);

        assert_eq!(store.sweep_expired().await.unwrap(), 1);
        assert!(!dir.path().join(&stale).exists());
        assert!(dir.path().join(&fresh).exists());
        assert!(foreign.exists());
    }

    #[tokio::test]
    async fn test_save_sweeps_expired_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path(), HOUR);

        let stale = store.save(b"old").await.unwrap();
        backdate(&dir.path().join(&stale), 2 * HOUR);

        let fresh = store.save(b"new").await.unwrap();
        assert!(!dir.path().join(&stale).exists());
        assert!(store.open(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_sweep_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path().join("absent"), HOUR);
        assert_eq!(store.sweep_expired().await.unwrap(), 0);
    }
}
