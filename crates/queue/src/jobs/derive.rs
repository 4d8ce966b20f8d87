//! Thumbnail/subtitle derivation job.

use mediarium_core::DeriveRequest;
use serde::{Deserialize, Serialize};

/// Job to derive thumbnail and subtitle assets for a persisted blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriveJob {
    /// Derivation job row tracking this work.
    pub job_id: i64,

    /// Media row the assets belong to.
    pub media_id: i64,

    /// Content hash locating the blob in storage.
    pub content_hash: String,

    /// True for video blobs (frame extraction + subtitle tracks).
    pub is_video: bool,

    /// Source pixel width.
    pub width: i32,

    /// Source pixel height.
    pub height: i32,

    /// Container duration; the thumbnail frame is taken at its midpoint.
    pub duration_seconds: f64,

    /// Number of embedded subtitle streams to extract.
    pub subtitle_streams: u32,
}

impl From<DeriveRequest> for DeriveJob {
    fn from(request: DeriveRequest) -> Self {
        Self {
            job_id: request.job_id,
            media_id: request.media_id,
            content_hash: request.content_hash,
            is_video: request.is_video,
            width: request.width,
            height: request.height,
            duration_seconds: request.duration_seconds,
            subtitle_streams: request.subtitle_streams,
        }
    }
}
