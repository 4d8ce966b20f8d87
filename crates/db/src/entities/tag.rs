//! Tag entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tag origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TagType {
    /// Created by a user through the API.
    #[sea_orm(string_value = "USER")]
    User,
    /// Created by the system.
    #[sea_orm(string_value = "SYSTEM")]
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_name = "type")]
    pub tag_type: TagType,

    /// Grouping prefix, unique together with `tag_name`.
    pub namespace: String,

    pub tag_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tag_media::Entity")]
    MediaLinks,
}

impl Related<super::tag_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MediaLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
