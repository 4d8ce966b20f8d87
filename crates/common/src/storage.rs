//! Content-addressed file storage.
//!
//! Uploads spill into `{root}/in/` while being received, then move to
//! `{root}/storage/{digest}` once hashed. Derived assets live next to the
//! blob: `{digest}.thumbnail.png` and `{digest}_subtitles/{n}.vtt`.

use std::path::{Path, PathBuf};

use crate::{AppError, AppResult};

/// Content-addressed media store rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ensure the intake and storage directories exist.
    pub async fn ensure_layout(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(self.intake_dir()).await?;
        tokio::fs::create_dir_all(self.storage_dir()).await?;
        Ok(())
    }

    /// Directory receiving in-flight uploads.
    #[must_use]
    pub fn intake_dir(&self) -> PathBuf {
        self.root.join("in")
    }

    /// Directory holding permanent blobs.
    #[must_use]
    pub fn storage_dir(&self) -> PathBuf {
        self.root.join("storage")
    }

    /// Path of the blob for a content hash.
    #[must_use]
    pub fn blob_path(&self, hash: &str) -> PathBuf {
        self.storage_dir().join(hash)
    }

    /// Path of the thumbnail for a content hash.
    #[must_use]
    pub fn thumbnail_path(&self, hash: &str) -> PathBuf {
        self.storage_dir().join(format!("{hash}.thumbnail.png"))
    }

    /// Directory holding extracted subtitle tracks for a content hash.
    #[must_use]
    pub fn subtitles_dir(&self, hash: &str) -> PathBuf {
        self.storage_dir().join(format!("{hash}_subtitles"))
    }

    /// Path of a numbered subtitle track (1-based index).
    #[must_use]
    pub fn subtitle_path(&self, hash: &str, index: u32, ext: &str) -> PathBuf {
        self.subtitles_dir(hash).join(format!("{index}.{ext}"))
    }

    /// Move a validated upload into permanent storage.
    ///
    /// Overwrites an existing blob at the same hash: identical bytes collapse
    /// to a single stored copy while each upload keeps its own Media row.
    pub async fn place(&self, temp_path: &Path, hash: &str) -> AppResult<PathBuf> {
        let dest = self.blob_path(hash);
        tokio::fs::rename(temp_path, &dest).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to move {} into storage: {e}",
                temp_path.display()
            ))
        })?;
        Ok(dest)
    }

    /// Remove a blob that no Media row references (upload rollback path).
    pub async fn remove_blob(&self, hash: &str) -> AppResult<()> {
        let path = self.blob_path(hash);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to remove blob {}: {e}",
                path.display()
            ))),
        }
    }

    /// Remove an abandoned intake file, logging instead of failing.
    pub async fn discard_intake(&self, temp_path: &Path) {
        if let Err(e) = tokio::fs::remove_file(temp_path).await {
            tracing::warn!(
                path = %temp_path.display(),
                error = %e,
                "Failed to remove abandoned intake file"
            );
        }
    }

    /// Count the subtitle tracks extracted for a hash.
    ///
    /// A missing directory means derivation has not produced any yet; that is
    /// "not ready", not an error.
    pub async fn count_subtitles(&self, hash: &str) -> AppResult<u32> {
        let dir = self.subtitles_dir(hash);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {e}",
                    dir.display()
                )))
            }
        };

        let mut count = 0;
        while entries
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?
            .is_some()
        {
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_place_moves_file_to_hash_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.ensure_layout().await.expect("layout");

        let temp = store.intake_dir().join("upload-1");
        std::fs::File::create(&temp)
            .and_then(|mut f| f.write_all(b"blob"))
            .expect("write temp");

        let dest = store.place(&temp, "abcdef1234").await.expect("place");
        assert_eq!(dest, store.blob_path("abcdef1234"));
        assert!(dest.exists());
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_place_overwrites_duplicate_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.ensure_layout().await.expect("layout");

        for n in 0..2 {
            let temp = store.intake_dir().join(format!("upload-{n}"));
            std::fs::File::create(&temp)
                .and_then(|mut f| f.write_all(b"same bytes"))
                .expect("write temp");
            store.place(&temp, "cafebabe11").await.expect("place");
        }

        let stored = std::fs::read(store.blob_path("cafebabe11")).expect("read");
        assert_eq!(stored, b"same bytes");
    }

    #[tokio::test]
    async fn test_count_subtitles_missing_dir_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.ensure_layout().await.expect("layout");

        assert_eq!(store.count_subtitles("deadbeef00").await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_count_subtitles_counts_tracks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MediaStore::new(dir.path());
        store.ensure_layout().await.expect("layout");

        let subs = store.subtitles_dir("deadbeef00");
        std::fs::create_dir_all(&subs).expect("mkdir");
        std::fs::write(subs.join("1.vtt"), "WEBVTT").expect("write");
        std::fs::write(subs.join("2.vtt"), "WEBVTT").expect("write");

        assert_eq!(store.count_subtitles("deadbeef00").await.expect("count"), 2);
    }
}
