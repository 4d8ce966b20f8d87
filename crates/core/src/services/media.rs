//! Media service: the upload pipeline and blob access.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use mediarium_common::{hash_file, AppError, AppResult, MediaStore};
use mediarium_db::{
    entities::media,
    repositories::{DerivationJobRepository, MediaRepository, TagRepository},
};
use sea_orm::Set;

use crate::services::probe::{MediaCategory, MediaProbe};

/// Request handed to the background derivation queue.
#[derive(Debug, Clone, PartialEq)]
pub struct DeriveRequest {
    /// Derivation job row tracking this work.
    pub job_id: i64,
    pub media_id: i64,
    pub content_hash: String,
    /// True for video blobs (frame extraction + subtitles).
    pub is_video: bool,
    pub width: i32,
    pub height: i32,
    pub duration_seconds: f64,
    pub subtitle_streams: u32,
}

/// Abstraction for queueing thumbnail/subtitle derivation.
///
/// Lets the upload pipeline enqueue background work without depending on the
/// queue implementation.
#[async_trait]
pub trait DerivationSink: Send + Sync {
    /// Queue a derivation request.
    async fn enqueue(&self, request: DeriveRequest) -> AppResult<()>;
}

/// Shared handle to a derivation sink.
pub type DerivationQueue = Arc<dyn DerivationSink>;

/// Sink that drops requests; used when no worker is running.
pub struct NoOpDerivationSink;

#[async_trait]
impl DerivationSink for NoOpDerivationSink {
    async fn enqueue(&self, request: DeriveRequest) -> AppResult<()> {
        tracing::warn!(
            media_id = request.media_id,
            "No derivation queue configured; dropping request"
        );
        Ok(())
    }
}

/// Input for an upload that has been spilled to the intake directory.
pub struct UploadInput {
    /// Where the multipart body was written.
    pub temp_path: PathBuf,
    /// Declared MIME type.
    pub media_type: String,
    /// Received size in bytes.
    pub size_bytes: i64,
}

/// Media service for the ingest pipeline and blob lookups.
#[derive(Clone)]
pub struct MediaService {
    media_repo: MediaRepository,
    tag_repo: TagRepository,
    job_repo: DerivationJobRepository,
    probe: MediaProbe,
    store: MediaStore,
    derivation: DerivationQueue,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(
        media_repo: MediaRepository,
        tag_repo: TagRepository,
        job_repo: DerivationJobRepository,
        probe: MediaProbe,
        store: MediaStore,
        derivation: DerivationQueue,
    ) -> Self {
        Self {
            media_repo,
            tag_repo,
            job_repo,
            probe,
            store,
            derivation,
        }
    }

    /// Run the ingest pipeline: probe, hash, place, persist, then queue
    /// derivation.
    ///
    /// Validation failures discard the intake file before any other side
    /// effect. Once the blob is placed, a failed transaction removes it again
    /// unless another Media row already owns that hash.
    pub async fn upload(&self, user_id: i64, input: UploadInput) -> AppResult<media::Model> {
        let Some(category) = MediaCategory::from_mime(&input.media_type) else {
            self.store.discard_intake(&input.temp_path).await;
            return Err(AppError::Validation(
                "File can only be an image or video type.".to_string(),
            ));
        };

        let outcome = match self.probe.probe(&input.temp_path, category).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.store.discard_intake(&input.temp_path).await;
                return Err(e);
            }
        };

        let content_hash = match hash_file(&input.temp_path).await {
            Ok(hash) => hash,
            Err(e) => {
                self.store.discard_intake(&input.temp_path).await;
                return Err(e);
            }
        };

        self.store.place(&input.temp_path, &content_hash).await?;

        let model = media::ActiveModel {
            content_hash: Set(content_hash.clone()),
            media_type: Set(input.media_type),
            width: Set(outcome.width),
            height: Set(outcome.height),
            duration_seconds: Set(outcome.duration_seconds),
            size_bytes: Set(input.size_bytes),
            created_at: Set(chrono::Utc::now().into()),
            created_by: Set(user_id),
            ..Default::default()
        };

        let media = match self.media_repo.insert_linked(model).await {
            Ok(media) => media,
            Err(e) => {
                self.cleanup_orphan_blob(&content_hash).await;
                return Err(e);
            }
        };

        self.queue_derivation(&media, category, outcome.subtitle_streams)
            .await;

        Ok(media)
    }

    /// Remove a placed blob after a failed insert, unless another row owns it.
    async fn cleanup_orphan_blob(&self, content_hash: &str) {
        match self.media_repo.count_by_hash(content_hash).await {
            Ok(0) => {
                if let Err(e) = self.store.remove_blob(content_hash).await {
                    tracing::warn!(
                        content_hash,
                        error = %e,
                        "Failed to remove orphaned blob after rollback"
                    );
                }
            }
            Ok(_) => {} // Another upload legitimately owns this blob
            Err(e) => {
                tracing::warn!(content_hash, error = %e, "Failed to check blob ownership");
            }
        }
    }

    /// Record a PENDING job and hand it to the queue. Best-effort: the upload
    /// response has already been decided, so failures are logged and the job
    /// row (if any) is marked FAILED for operators.
    async fn queue_derivation(
        &self,
        media: &media::Model,
        category: MediaCategory,
        subtitle_streams: u32,
    ) {
        let job = match self.job_repo.create_pending(media.id).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(media_id = media.id, error = %e, "Failed to record derivation job");
                return;
            }
        };

        let request = DeriveRequest {
            job_id: job.id,
            media_id: media.id,
            content_hash: media.content_hash.clone(),
            is_video: category == MediaCategory::Video,
            width: media.width,
            height: media.height,
            duration_seconds: media.duration_seconds,
            subtitle_streams,
        };

        if let Err(e) = self.derivation.enqueue(request).await {
            tracing::error!(media_id = media.id, error = %e, "Failed to enqueue derivation");
            if let Err(e) = self.job_repo.mark_failed(job.id, "enqueue failed").await {
                tracing::error!(job_id = job.id, error = %e, "Failed to mark job failed");
            }
        }
    }

    /// Get the media row for a content hash.
    pub async fn get_by_hash(&self, hash: &str) -> AppResult<media::Model> {
        self.media_repo.get_by_hash(hash).await
    }

    /// Resolve the blob path for a hash, verifying the row and the file.
    pub async fn resolve_blob(&self, hash: &str) -> AppResult<(media::Model, PathBuf)> {
        let media = self.media_repo.get_by_hash(hash).await?;
        let path = self.store.blob_path(hash);

        tokio::fs::metadata(&path).await.map_err(|e| {
            AppError::Storage(format!("Blob missing for {hash}: {e}"))
        })?;

        Ok((media, path))
    }

    /// Resolve the thumbnail path for a hash.
    ///
    /// A missing file means derivation has not finished; surfaced as 404 so
    /// clients retry later.
    pub async fn resolve_thumbnail(&self, hash: &str) -> AppResult<PathBuf> {
        self.media_repo.get_by_hash(hash).await?;

        let path = self.store.thumbnail_path(hash);
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(path),
            Err(_) => Err(AppError::NotFound(
                "Thumbnail is not available yet".to_string(),
            )),
        }
    }

    /// Count the extracted subtitle tracks for a hash.
    pub async fn count_subtitles(&self, hash: &str) -> AppResult<u32> {
        self.media_repo.get_by_hash(hash).await?;
        self.store.count_subtitles(hash).await
    }

    /// Resolve a numbered subtitle track, preferring `.srt` over `.vtt`.
    pub async fn resolve_subtitle(&self, hash: &str, index: u32) -> AppResult<PathBuf> {
        self.media_repo.get_by_hash(hash).await?;

        for ext in ["srt", "vtt"] {
            let path = self.store.subtitle_path(hash, index, ext);
            if tokio::fs::metadata(&path).await.is_ok() {
                return Ok(path);
            }
        }

        Err(AppError::NotFound(format!(
            "No subtitle track {index} for that media"
        )))
    }

    /// Link an existing tag to media owned by the viewer.
    pub async fn add_tag(&self, viewer_id: i64, media_id: i64, tag_id: i64) -> AppResult<()> {
        let media = self
            .media_repo
            .find_by_id(media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media: {media_id}")))?;

        if media.created_by != viewer_id {
            return Err(AppError::Forbidden("Not your media".to_string()));
        }

        self.tag_repo
            .find_by_id(tag_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag: {tag_id}")))?;

        self.tag_repo.create_link(tag_id, media_id).await?;
        Ok(())
    }
}
