//! Tag repository.

use std::sync::Arc;

use crate::entities::{tag, tag_media, Tag};
use mediarium_common::{AppError, AppResult};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Parsed tag search parameters.
#[derive(Debug, Clone, Default)]
pub struct TagSearch {
    /// Namespace prefix, present when the `namespace:name` syntax was used.
    pub namespace: Option<String>,
    /// Name fragment to match.
    pub name: String,
    /// Tag ids to exclude from the results.
    pub exclude: Vec<i64>,
}

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tag by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<tag::Model>> {
        Tag::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get or create a tag for `(namespace, tag_name)`.
    ///
    /// Returns the tag and whether this call created it. Concurrent creates
    /// race through `ON CONFLICT DO NOTHING` rather than check-then-insert,
    /// so exactly one row ever exists per pair.
    pub async fn get_or_create(
        &self,
        namespace: &str,
        tag_name: &str,
        tag_type: tag::TagType,
    ) -> AppResult<(tag::Model, bool)> {
        let insert = Tag::insert(tag::ActiveModel {
            tag_type: Set(tag_type),
            namespace: Set(namespace.to_string()),
            tag_name: Set(tag_name.to_string()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([tag::Column::Namespace, tag::Column::TagName])
                .do_nothing()
                .to_owned(),
        )
        .exec(self.db.as_ref())
        .await;

        let created = match insert {
            Ok(_) => true,
            Err(DbErr::RecordNotInserted) => false,
            Err(e) => return Err(AppError::Database(e.to_string())),
        };

        let tag = Tag::find()
            .filter(tag::Column::Namespace.eq(namespace))
            .filter(tag::Column::TagName.eq(tag_name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| {
                AppError::Database(format!("Tag vanished after upsert: {namespace}:{tag_name}"))
            })?;

        Ok((tag, created))
    }

    /// Search tags, returning at most `limit` matches ordered by id.
    pub async fn search(&self, params: &TagSearch, limit: u64) -> AppResult<Vec<tag::Model>> {
        let mut query = Tag::find();

        if let Some(ref namespace) = params.namespace {
            query = query.filter(tag::Column::Namespace.starts_with(namespace));
        }
        if !params.name.is_empty() {
            query = query.filter(tag::Column::TagName.contains(&params.name));
        }
        if !params.exclude.is_empty() {
            query = query.filter(tag::Column::Id.is_not_in(params.exclude.iter().copied()));
        }

        query
            .order_by_asc(tag::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Link a tag to a media row.
    pub async fn create_link(&self, tag_id: i64, media_id: i64) -> AppResult<tag_media::Model> {
        tag_media::ActiveModel {
            tag_id: Set(tag_id),
            media_id: Set(media_id),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_tag(id: i64, namespace: &str, name: &str) -> tag::Model {
        tag::Model {
            id,
            tag_type: tag::TagType::User,
            namespace: namespace.to_string(),
            tag_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_inserts_new_tag() {
        let created = test_tag(1, "genre", "documentary");
        // Postgres inserts go through RETURNING, so the insert and the
        // re-select each consume one query result set.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created.clone()], [created.clone()]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let (tag, was_created) = repo
            .get_or_create("genre", "documentary", tag::TagType::User)
            .await
            .unwrap();
        assert!(was_created);
        assert_eq!(tag, created);
    }

    #[tokio::test]
    async fn test_search_limits_and_excludes() {
        let rows = vec![test_tag(1, "genre", "drama"), test_tag(2, "genre", "dramedy")];
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows.clone()])
            .into_connection();

        let conn = Arc::new(conn);
        let params = TagSearch {
            namespace: Some("genre".to_string()),
            name: "dram".to_string(),
            exclude: vec![9],
        };
        let found = {
            let repo = TagRepository::new(Arc::clone(&conn));
            repo.search(&params, 10).await.unwrap()
        };
        assert_eq!(found, rows);

        let conn = Arc::try_unwrap(conn).unwrap();
        let sql = format!("{:?}", conn.into_transaction_log()[0]);
        assert!(sql.contains("LIMIT"), "search must be capped: {sql}");
        assert!(sql.contains("NOT IN"), "exclusion must be applied: {sql}");
    }
}
