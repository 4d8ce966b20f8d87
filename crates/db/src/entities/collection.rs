//! Collection entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Collection kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CollectionType {
    /// The implicit personal collection created at registration.
    #[sea_orm(string_value = "DEFAULT")]
    Default,
    /// A user-created collection.
    #[sea_orm(string_value = "CUSTOM")]
    Custom,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collection")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    /// At most one DEFAULT collection exists per owner.
    #[sea_orm(column_name = "type")]
    pub collection_type: CollectionType,

    pub owner_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,

    #[sea_orm(has_many = "super::collection_media::Entity")]
    MediaLinks,

    #[sea_orm(has_many = "super::collection_share::Entity")]
    Shares,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::collection_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MediaLinks.def()
    }
}

impl Related<super::collection_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
