//! Derive worker: thumbnails and subtitle tracks.

use apalis::prelude::*;
use mediarium_common::MediaStore;
use mediarium_db::repositories::DerivationJobRepository;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::jobs::DeriveJob;
use crate::retry::RetryConfig;

/// Thumbnail bounding box: the longer edge of the output.
const THUMBNAIL_EDGE: u32 = 192;

/// Upper bound on a single ffmpeg invocation.
const FFMPEG_TIMEOUT: Duration = Duration::from_secs(300);

/// Context for the derive worker.
#[derive(Clone)]
pub struct DeriveContext {
    pub job_repo: DerivationJobRepository,
    pub store: MediaStore,
    pub retry: RetryConfig,
}

impl DeriveContext {
    /// Create a new derive context.
    #[must_use]
    pub const fn new(job_repo: DerivationJobRepository, store: MediaStore) -> Self {
        Self {
            job_repo,
            store,
            retry: RetryConfig { max_attempts: 3 },
        }
    }
}

/// Worker function for deriving thumbnail/subtitle assets.
///
/// # Errors
/// Returns an error if derivation fails, letting apalis retry; the failure is
/// also recorded on the derivation job row.
pub async fn derive_worker(job: DeriveJob, ctx: Data<DeriveContext>) -> Result<(), Error> {
    info!(
        media_id = job.media_id,
        content_hash = %job.content_hash,
        is_video = job.is_video,
        "Deriving assets"
    );

    let attempts = match ctx.job_repo.mark_running(job.job_id).await {
        Ok(row) => row.attempts.max(1) as u32,
        Err(e) => {
            // The status row is observability, not correctness; keep going.
            warn!(job_id = job.job_id, error = %e, "Failed to mark job running");
            1
        }
    };

    match derive_assets(&job, &ctx).await {
        Ok(()) => {
            if let Err(e) = ctx.job_repo.mark_done(job.job_id).await {
                warn!(job_id = job.job_id, error = %e, "Failed to mark job done");
            }
            info!(media_id = job.media_id, "Assets derived");
            Ok(())
        }
        Err(e) => {
            error!(media_id = job.media_id, error = %e, "Derivation failed");
            if let Err(mark_err) = ctx.job_repo.mark_failed(job.job_id, &e).await {
                warn!(job_id = job.job_id, error = %mark_err, "Failed to mark job failed");
            }

            if ctx.retry.should_retry(attempts) {
                let err: Box<dyn std::error::Error + Send + Sync> = e.into();
                Err(Error::Failed(err.into()))
            } else {
                warn!(
                    job_id = job.job_id,
                    attempts, "Derivation attempts exhausted; leaving job FAILED"
                );
                Ok(())
            }
        }
    }
}

async fn derive_assets(job: &DeriveJob, ctx: &DeriveContext) -> Result<(), String> {
    let blob = ctx.store.blob_path(&job.content_hash);
    let thumbnail = ctx.store.thumbnail_path(&job.content_hash);

    match thumbnail_dimensions(job.width, job.height) {
        Some((w, h)) => {
            if job.is_video {
                extract_video_frame(&blob, &thumbnail, job.duration_seconds, w, h).await?;
            } else {
                render_image_thumbnail(&blob, &thumbnail, w, h).await?;
            }
        }
        None => warn!(
            media_id = job.media_id,
            "Source has no usable dimensions; skipping thumbnail"
        ),
    }

    if job.is_video && job.subtitle_streams > 0 {
        extract_subtitles(ctx, job).await?;
    }

    Ok(())
}

/// Aspect-preserving bounding box with the longer edge at 192 px.
/// Returns `None` when the source dimensions are unusable.
fn thumbnail_dimensions(width: i32, height: i32) -> Option<(u32, u32)> {
    if width <= 0 || height <= 0 {
        return None;
    }
    let (width, height) = (width as u32, height as u32);

    let dims = if width > height {
        let scaled = (f64::from(THUMBNAIL_EDGE) / f64::from(width) * f64::from(height)) as u32;
        (THUMBNAIL_EDGE, scaled.max(1))
    } else {
        let scaled = (f64::from(THUMBNAIL_EDGE) / f64::from(height) * f64::from(width)) as u32;
        (scaled.max(1), THUMBNAIL_EDGE)
    };
    Some(dims)
}

/// Decode, resize and re-encode an image blob as a PNG thumbnail.
async fn render_image_thumbnail(
    blob: &Path,
    thumbnail: &Path,
    width: u32,
    height: u32,
) -> Result<(), String> {
    let blob = blob.to_path_buf();
    let thumbnail = thumbnail.to_path_buf();

    tokio::task::spawn_blocking(move || {
        // Blobs are stored without extension, so the format must be sniffed.
        let img = image::ImageReader::open(&blob)
            .map_err(|e| format!("Failed to open blob: {e}"))?
            .with_guessed_format()
            .map_err(|e| format!("Failed to sniff blob format: {e}"))?
            .decode()
            .map_err(|e| format!("Failed to decode blob: {e}"))?;

        img.resize_exact(width, height, image::imageops::FilterType::Lanczos3)
            .save_with_format(&thumbnail, image::ImageFormat::Png)
            .map_err(|e| format!("Failed to write thumbnail: {e}"))
    })
    .await
    .map_err(|e| format!("Thumbnail task panicked: {e}"))?
}

/// Grab a single frame at the midpoint of the video and scale it.
async fn extract_video_frame(
    blob: &Path,
    thumbnail: &Path,
    duration_seconds: f64,
    width: u32,
    height: u32,
) -> Result<(), String> {
    let midpoint = duration_seconds * 0.5;

    run_ffmpeg(&[
        "-y".to_string(),
        "-ss".to_string(),
        format!("{midpoint:.3}"),
        "-i".to_string(),
        blob.display().to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        format!("scale={width}:{height}"),
        thumbnail.display().to_string(),
    ])
    .await
}

/// Extract each embedded subtitle stream into a numbered `.vtt` file.
async fn extract_subtitles(ctx: &DeriveContext, job: &DeriveJob) -> Result<(), String> {
    let blob = ctx.store.blob_path(&job.content_hash);
    let dir = ctx.store.subtitles_dir(&job.content_hash);

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| format!("Failed to create subtitles dir: {e}"))?;

    for stream in 0..job.subtitle_streams {
        let track = ctx
            .store
            .subtitle_path(&job.content_hash, stream + 1, "vtt");

        run_ffmpeg(&[
            "-y".to_string(),
            "-i".to_string(),
            blob.display().to_string(),
            "-map".to_string(),
            format!("0:s:{stream}"),
            track.display().to_string(),
        ])
        .await?;
    }

    Ok(())
}

async fn run_ffmpeg(args: &[String]) -> Result<(), String> {
    let output = tokio::time::timeout(
        FFMPEG_TIMEOUT,
        tokio::process::Command::new("ffmpeg").args(args).output(),
    )
    .await
    .map_err(|_| format!("ffmpeg timed out after {}s", FFMPEG_TIMEOUT.as_secs()))?
    .map_err(|e| format!("Failed to run ffmpeg: {e}"))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("ffmpeg failed: {}", stderr.trim()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_dimensions_landscape() {
        let (w, h) = thumbnail_dimensions(1920, 1080).unwrap();
        assert_eq!(w, 192);
        assert_eq!(h, 108);
    }

    #[test]
    fn test_thumbnail_dimensions_portrait() {
        let (w, h) = thumbnail_dimensions(1080, 1920).unwrap();
        assert_eq!(w, 108);
        assert_eq!(h, 192);
    }

    #[test]
    fn test_thumbnail_dimensions_square() {
        assert_eq!(thumbnail_dimensions(640, 640), Some((192, 192)));
    }

    #[test]
    fn test_thumbnail_dimensions_preserves_aspect_within_rounding() {
        let (w, h) = thumbnail_dimensions(1237, 431).unwrap();
        assert_eq!(w, 192);
        let expected = f64::from(192) / 1237.0 * 431.0;
        assert!((f64::from(h) - expected).abs() <= 1.0);
    }

    #[test]
    fn test_thumbnail_dimensions_rejects_degenerate_sources() {
        assert_eq!(thumbnail_dimensions(0, 480), None);
        assert_eq!(thumbnail_dimensions(640, -1), None);
    }

    #[test]
    fn test_thumbnail_dimensions_never_rounds_to_zero() {
        // Extreme aspect ratio: 192/4000 * 10 rounds below 1
        let (w, h) = thumbnail_dimensions(4000, 10).unwrap();
        assert_eq!(w, 192);
        assert_eq!(h, 1);
    }

    #[tokio::test]
    async fn test_render_image_thumbnail_longer_edge_is_192() {
        let dir = tempfile::tempdir().unwrap();
        let blob = dir.path().join("blob");
        let thumb = dir.path().join("thumb.png");

        image::RgbImage::new(640, 480)
            .save_with_format(&blob, image::ImageFormat::Png)
            .unwrap();

        let (w, h) = thumbnail_dimensions(640, 480).unwrap();
        render_image_thumbnail(&blob, &thumb, w, h).await.unwrap();

        let rendered = image::open(&thumb).unwrap();
        assert_eq!(rendered.width().max(rendered.height()), 192);
        assert_eq!(rendered.width(), 192);
        assert_eq!(rendered.height(), 144);
    }
}
