//! API response types.

use mediarium_db::entities::{media, tag, user};
use serde::Serialize;

/// Media row response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub id: i64,
    pub content_hash: String,
    pub media_type: String,
    pub width: i32,
    pub height: i32,
    pub duration_seconds: f64,
    pub size_bytes: i64,
    pub created_at: String,
    pub created_by: i64,
}

impl From<media::Model> for MediaResponse {
    fn from(m: media::Model) -> Self {
        Self {
            id: m.id,
            content_hash: m.content_hash,
            media_type: m.media_type,
            width: m.width,
            height: m.height,
            duration_seconds: m.duration_seconds,
            size_bytes: m.size_bytes,
            created_at: m.created_at.to_rfc3339(),
            created_by: m.created_by,
        }
    }
}

/// Public user response; never carries the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
        }
    }
}

/// Tag response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub tag_type: tag::TagType,
    pub namespace: String,
    pub tag_name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(t: tag::Model) -> Self {
        Self {
            id: t.id,
            tag_type: t.tag_type,
            namespace: t.namespace,
            tag_name: t.tag_name,
        }
    }
}
