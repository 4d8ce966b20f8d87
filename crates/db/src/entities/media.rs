//! Media entity (uploaded images and videos).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Lowercase hex SHA-1 digest of the blob. Indexed but not unique:
    /// duplicate uploads share one stored blob while keeping their own rows.
    pub content_hash: String,

    /// MIME type
    pub media_type: String,

    /// Pixel width (max across streams for video)
    pub width: i32,

    /// Pixel height (max across streams for video)
    pub height: i32,

    /// Container duration; 0 for still images
    pub duration_seconds: f64,

    /// Blob size in bytes
    pub size_bytes: i64,

    pub created_at: DateTimeWithTimeZone,

    /// Uploading user
    pub created_by: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::collection_media::Entity")]
    CollectionLinks,

    #[sea_orm(has_many = "super::tag_media::Entity")]
    TagLinks,

    #[sea_orm(has_many = "super::derivation_job::Entity")]
    DerivationJobs,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::collection_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CollectionLinks.def()
    }
}

impl Related<super::tag_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TagLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this row describes a video blob.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.media_type.starts_with("video/")
    }
}
