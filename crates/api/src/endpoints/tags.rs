//! Tag endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use mediarium_common::AppResult;
use mediarium_core::{CreateTagInput, TagOutcome};
use serde::Deserialize;

use crate::{middleware::AppState, response::TagResponse};

/// Create a tag, or return the existing one for the same
/// `(namespace, tagName)` pair.
///
/// 201 when this request created the tag, 200 when it already existed.
async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<CreateTagInput>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.tag_service.get_or_create(req).await?;

    Ok(match outcome {
        TagOutcome::Created(tag) => (StatusCode::CREATED, Json(TagResponse::from(tag))),
        TagOutcome::Existing(tag) => (StatusCode::OK, Json(TagResponse::from(tag))),
    })
}

/// Tag search query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
    /// Comma-separated tag ids to leave out of the results.
    pub exclude: Option<String>,
}

/// Search tags by fragment, up to ten results.
async fn search_tags(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<TagResponse>>> {
    let exclude = query
        .exclude
        .as_deref()
        .map(parse_exclude_list)
        .unwrap_or_default();

    let tags = state.tag_service.search(&query.search, exclude).await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

/// Parse a comma-separated id list, ignoring blanks and junk entries.
fn parse_exclude_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tag))
        .route("/search", get(search_tags))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exclude_list() {
        assert_eq!(parse_exclude_list("1,2,3"), vec![1, 2, 3]);
        assert_eq!(parse_exclude_list("7, 8 ,junk,"), vec![7, 8]);
        assert!(parse_exclude_list("").is_empty());
    }
}
