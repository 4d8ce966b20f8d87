//! Media endpoints: upload, listing, download, subtitles.

use std::path::{Path as FsPath, PathBuf};

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use mediarium_common::{hash::is_valid_hash, AppError, AppResult};
use mediarium_core::{ListMediaInput, UploadInput};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::{extractors::SessionUser, middleware::AppState, response::MediaResponse};

/// Largest chunk served for a single range request.
const MAX_CHUNK: u64 = 1024 * 1024;

/// Range served when the header is present but malformed.
const FALLBACK_END: u64 = 65536;

/// Upload a media file via multipart form.
///
/// The `file` field streams into the intake directory; the ingest pipeline
/// takes over from there.
async fn upload(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<MediaResponse>> {
    let mut saved: Option<(PathBuf, String, i64)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let media_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let temp_path = state
            .store
            .intake_dir()
            .join(Uuid::new_v4().simple().to_string());
        let mut file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to open intake file: {e}")))?;

        let mut size_bytes: i64 = 0;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    state.store.discard_intake(&temp_path).await;
                    return Err(AppError::BadRequest(e.to_string()));
                }
            };
            size_bytes += chunk.len() as i64;
            if let Err(e) = file.write_all(&chunk).await {
                state.store.discard_intake(&temp_path).await;
                return Err(AppError::Storage(format!("Failed to spill upload: {e}")));
            }
        }
        file.flush()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to flush upload: {e}")))?;

        saved = Some((temp_path, media_type, size_bytes));
        break;
    }

    let Some((temp_path, media_type, size_bytes)) = saved else {
        return Err(AppError::Validation(
            "This path must be used for a file upload only.".to_string(),
        ));
    };

    let media = state
        .media_service
        .upload(
            user.id,
            UploadInput {
                temp_path,
                media_type,
                size_bytes,
            },
        )
        .await?;

    Ok(Json(media.into()))
}

/// List visible media.
async fn list(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    Json(req): Json<ListMediaInput>,
) -> AppResult<Json<Vec<MediaResponse>>> {
    let rows = state.library_service.list(user.id, req).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Byte range to serve for a download.
#[derive(Debug, PartialEq, Eq)]
enum RangeSpec {
    /// Whole file, 200.
    Full,
    /// Inclusive byte window, 206.
    Partial { start: u64, end: u64 },
}

/// Interpret a Range header against a file of `total` bytes.
///
/// Missing header serves the whole file. A malformed header (no `bytes=`
/// prefix) falls back to the first 64 KiB. Every partial response is capped
/// at 1 MiB no matter what was asked for.
fn parse_range(header: Option<&str>, total: u64) -> RangeSpec {
    let Some(header) = header else {
        return RangeSpec::Full;
    };

    let last = total.saturating_sub(1);

    let (start, end) = if let Some(spec) = header.strip_prefix("bytes=") {
        let mut parts = spec.splitn(2, '-');
        let start = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
        let end = parts
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(last);
        (start, end)
    } else {
        (0, FALLBACK_END)
    };

    let start = start.min(last);
    let mut end = end.clamp(start, last);
    if end - start + 1 > MAX_CHUNK {
        end = start + MAX_CHUNK - 1;
    }

    RangeSpec::Partial { start, end }
}

/// Stream a whole file with the given content type.
async fn stream_file(path: &FsPath, content_type: &str) -> AppResult<Response> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to open {}: {e}", path.display())))?;

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [(header::CONTENT_TYPE, content_type.to_string())],
        body,
    )
        .into_response())
}

/// Stream an inclusive byte window of a file as a 206 response.
async fn stream_range(
    path: &FsPath,
    content_type: &str,
    start: u64,
    end: u64,
    total: u64,
) -> AppResult<Response> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to open {}: {e}", path.display())))?;

    file.seek(SeekFrom::Start(start))
        .await
        .map_err(|e| AppError::Storage(format!("Failed to seek {}: {e}", path.display())))?;

    let chunk_size = end - start + 1;
    let body = Body::from_stream(ReaderStream::new(file.take(chunk_size)));

    Ok((
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_RANGE,
                format!("bytes {start}-{end}/{total}"),
            ),
            (header::ACCEPT_RANGES, "bytes".to_string()),
            (header::CONTENT_LENGTH, chunk_size.to_string()),
        ],
        body,
    )
        .into_response())
}

fn validate_hash(hash: &str) -> AppResult<()> {
    if is_valid_hash(hash) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "hash must be 5-40 hex characters".to_string(),
        ))
    }
}

async fn serve_download(
    state: AppState,
    hash: String,
    thumbnail: bool,
    headers: HeaderMap,
) -> AppResult<Response> {
    validate_hash(&hash)?;

    if thumbnail {
        let path = state.media_service.resolve_thumbnail(&hash).await?;
        return stream_file(&path, "image/png").await;
    }

    let (media, path) = state.media_service.resolve_blob(&hash).await?;

    if !media.is_video() {
        return stream_file(&path, &media.media_type).await;
    }

    let total = tokio::fs::metadata(&path)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to stat {}: {e}", path.display())))?
        .len();

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    match parse_range(range_header, total) {
        RangeSpec::Full => stream_file(&path, &media.media_type).await,
        RangeSpec::Partial { start, end } => {
            stream_range(&path, &media.media_type, start, end, total).await
        }
    }
}

/// Download a blob.
async fn download(
    Path(hash): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    serve_download(state, hash, false, headers).await
}

/// Download a blob or its thumbnail.
async fn download_with_thumbnail(
    Path((hash, thumbnail)): Path<(String, String)>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let thumbnail = matches!(thumbnail.as_str(), "true" | "1");
    serve_download(state, hash, thumbnail, headers).await
}

/// Subtitle track count response.
#[derive(Debug, Serialize)]
pub struct SubtitleTracksResponse {
    pub tracks: u32,
}

/// Count the extracted subtitle tracks for a blob.
async fn list_subtitles(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<SubtitleTracksResponse>> {
    validate_hash(&hash)?;
    let tracks = state.media_service.count_subtitles(&hash).await?;
    Ok(Json(SubtitleTracksResponse { tracks }))
}

fn subtitle_content_type(path: &FsPath) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("srt") => "application/x-subrip",
        _ => "text/vtt",
    }
}

/// Download a numbered subtitle track (`.srt` preferred over `.vtt`).
async fn download_subtitle(
    Path((hash, index)): Path<(String, u32)>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    validate_hash(&hash)?;
    if index == 0 {
        return Err(AppError::Validation(
            "index must be a positive integer".to_string(),
        ));
    }

    let path = state.media_service.resolve_subtitle(&hash, index).await?;
    stream_file(&path, subtitle_content_type(&path)).await
}

/// Get the media row for a hash.
async fn get_media(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<MediaResponse>> {
    validate_hash(&hash)?;
    let media = state.media_service.get_by_hash(&hash).await?;
    Ok(Json(media.into()))
}

/// Add-tag request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTagRequest {
    pub media_id: i64,
    pub tag_id: i64,
}

/// Link an existing tag to owned media.
async fn add_tag(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    Json(req): Json<AddTagRequest>,
) -> AppResult<StatusCode> {
    state
        .media_service
        .add_tag(user.id, req.media_id, req.tag_id)
        .await?;
    Ok(StatusCode::OK)
}

/// Share request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub collection_id: i64,
    pub user_id: i64,
}

/// Grant a user read access to an owned collection.
async fn share(
    SessionUser(user): SessionUser,
    State(state): State<AppState>,
    Json(req): Json<ShareRequest>,
) -> AppResult<StatusCode> {
    state
        .library_service
        .share(user.id, req.collection_id, req.user_id)
        .await?;
    Ok(StatusCode::OK)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/list", post(list))
        .route("/addTag", post(add_tag))
        .route("/share", post(share))
        .route("/download/{hash}", get(download))
        .route("/download/{hash}/{thumbnail}", get(download_with_thumbnail))
        .route("/listSubtitles/{hash}", get(list_subtitles))
        .route("/downloadSubtitle/{hash}/{index}", get(download_subtitle))
        .route("/{hash}", get(get_media))
}
