//! Media probing.
//!
//! Extracts pixel dimensions and duration before a Media row is written.
//! Images are read header-only through the `image` crate; videos go through
//! an `ffprobe` subprocess whose JSON output covers every stream in the
//! container.

use std::path::Path;
use std::time::Duration;

use mediarium_common::{AppError, AppResult};
use serde::Deserialize;

/// Accepted upload categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Image,
    Video,
}

impl MediaCategory {
    /// Classify a MIME type, rejecting anything that is not image/video.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Result of probing an upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    /// Pixel width; for video the maximum across all streams.
    pub width: i32,
    /// Pixel height; for video the maximum across all streams.
    pub height: i32,
    /// Container duration; 0 for still images.
    pub duration_seconds: f64,
    /// Number of embedded subtitle streams (video only).
    pub subtitle_streams: u32,
}

/// Media prober with a bounded subprocess timeout.
#[derive(Debug, Clone)]
pub struct MediaProbe {
    timeout: Duration,
}

impl MediaProbe {
    /// Create a prober whose ffprobe invocations are killed after `timeout`.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Probe a file of the given category.
    pub async fn probe(&self, path: &Path, category: MediaCategory) -> AppResult<ProbeOutcome> {
        match category {
            MediaCategory::Image => probe_image(path).await,
            MediaCategory::Video => self.probe_video(path).await,
        }
    }

    async fn probe_video(&self, path: &Path) -> AppResult<ProbeOutcome> {
        let output = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new("ffprobe")
                .arg("-v")
                .arg("error")
                .arg("-print_format")
                .arg("json")
                .arg("-show_format")
                .arg("-show_streams")
                .arg(path)
                .output(),
        )
        .await
        .map_err(|_| {
            AppError::Probe(format!(
                "ffprobe timed out after {}s for {}",
                self.timeout.as_secs(),
                path.display()
            ))
        })?
        .map_err(|e| AppError::Probe(format!("Failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Probe(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        parse_ffprobe_output(&output.stdout)
    }
}

/// Header-only dimension read; no full decode.
async fn probe_image(path: &Path) -> AppResult<ProbeOutcome> {
    let path = path.to_path_buf();
    let (width, height) = tokio::task::spawn_blocking(move || {
        image::ImageReader::open(&path)
            .map_err(|e| AppError::Probe(format!("Failed to open {}: {e}", path.display())))?
            .with_guessed_format()
            .map_err(|e| AppError::Probe(format!("Failed to sniff {}: {e}", path.display())))?
            .into_dimensions()
            .map_err(|e| AppError::Probe(format!("Failed to read dimensions: {e}")))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Probe task panicked: {e}")))??;

    Ok(ProbeOutcome {
        width: width as i32,
        height: height as i32,
        duration_seconds: 0.0,
        subtitle_streams: 0,
    })
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<i32>,
    height: Option<i32>,
    codec_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Fold the stream list into max dimensions, container duration and a
/// subtitle stream count. Rotated/multi-resolution containers report several
/// video streams; the maximum over each axis is used.
fn parse_ffprobe_output(stdout: &[u8]) -> AppResult<ProbeOutcome> {
    let parsed: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| AppError::Probe(format!("Unparseable ffprobe output: {e}")))?;

    let mut width = 0;
    let mut height = 0;
    let mut subtitle_streams = 0;

    for stream in &parsed.streams {
        if let Some(w) = stream.width {
            width = width.max(w);
        }
        if let Some(h) = stream.height {
            height = height.max(h);
        }
        if stream.codec_type.as_deref() == Some("subtitle") {
            subtitle_streams += 1;
        }
    }

    let duration_seconds = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(ProbeOutcome {
        width,
        height,
        duration_seconds,
        subtitle_streams,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mime() {
        assert_eq!(MediaCategory::from_mime("image/png"), Some(MediaCategory::Image));
        assert_eq!(MediaCategory::from_mime("video/mp4"), Some(MediaCategory::Video));
        assert_eq!(MediaCategory::from_mime("application/pdf"), None);
        assert_eq!(MediaCategory::from_mime("text/plain"), None);
    }

    #[test]
    fn test_parse_ffprobe_takes_max_dimensions() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 800},
                {"codec_type": "video", "width": 1080, "height": 1920},
                {"codec_type": "audio"},
                {"codec_type": "subtitle"},
                {"codec_type": "subtitle"}
            ],
            "format": {"duration": "12.480000"}
        }"#;

        let outcome = parse_ffprobe_output(json).unwrap();
        assert_eq!(outcome.width, 1920);
        assert_eq!(outcome.height, 1920);
        assert!((outcome.duration_seconds - 12.48).abs() < 1e-9);
        assert_eq!(outcome.subtitle_streams, 2);
    }

    #[test]
    fn test_parse_ffprobe_missing_fields_default_to_zero() {
        let outcome = parse_ffprobe_output(b"{}").unwrap();
        assert_eq!(outcome.width, 0);
        assert_eq!(outcome.height, 0);
        assert_eq!(outcome.duration_seconds, 0.0);
        assert_eq!(outcome.subtitle_streams, 0);
    }

    #[test]
    fn test_parse_ffprobe_rejects_garbage() {
        assert!(parse_ffprobe_output(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_probe_image_reads_header_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.png");
        image::RgbImage::new(10, 5).save(&path).unwrap();

        let probe = MediaProbe::new(Duration::from_secs(5));
        let outcome = probe.probe(&path, MediaCategory::Image).await.unwrap();
        assert_eq!(outcome.width, 10);
        assert_eq!(outcome.height, 5);
        assert_eq!(outcome.duration_seconds, 0.0);
    }

    #[tokio::test]
    async fn test_probe_image_corrupt_file_is_probe_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let probe = MediaProbe::new(Duration::from_secs(5));
        let err = probe.probe(&path, MediaCategory::Image).await.unwrap_err();
        assert!(matches!(err, AppError::Probe(_)));
    }
}
