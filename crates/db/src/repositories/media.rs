//! Media repository.

use std::sync::Arc;

use crate::entities::{collection, collection_media, media, tag_media, Collection, Media};
use mediarium_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

/// Fixed page size for media listings.
pub const PAGE_SIZE: u64 = 100;

/// Listing scope relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Media the viewer uploaded.
    #[serde(rename = "Self")]
    Own,
    /// Media in collections shared with the viewer.
    Shared,
    /// Union of the above, deduplicated by media id.
    All,
}

/// Media repository for database operations.
#[derive(Clone)]
pub struct MediaRepository {
    db: Arc<DatabaseConnection>,
}

impl MediaRepository {
    /// Create a new media repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a media row by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<media::Model>> {
        Media::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the first media row for a content hash.
    ///
    /// Duplicate uploads produce several rows per hash; the lowest id is the
    /// first uploader's row and carries the canonical metadata.
    pub async fn find_by_hash(&self, hash: &str) -> AppResult<Option<media::Model>> {
        Media::find()
            .filter(media::Column::ContentHash.eq(hash))
            .order_by_asc(media::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a media row by content hash, returning an error if not found.
    pub async fn get_by_hash(&self, hash: &str) -> AppResult<media::Model> {
        self.find_by_hash(hash)
            .await?
            .ok_or_else(|| AppError::NotFound("No media found with that hash".to_string()))
    }

    /// Count the rows referencing a content hash.
    pub async fn count_by_hash(&self, hash: &str) -> AppResult<u64> {
        Media::find()
            .filter(media::Column::ContentHash.eq(hash))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a media row and link it into the uploader's DEFAULT collection,
    /// atomically.
    ///
    /// A missing default collection rolls the whole unit back instead of
    /// leaving an unlinked row behind.
    pub async fn insert_linked(&self, model: media::ActiveModel) -> AppResult<media::Model> {
        let result = self
            .db
            .transaction::<_, media::Model, AppError>(|txn| {
                Box::pin(async move {
                    let inserted = model
                        .insert(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;

                    let default_collection = Collection::find()
                        .filter(collection::Column::OwnerId.eq(inserted.created_by))
                        .filter(
                            collection::Column::CollectionType
                                .eq(collection::CollectionType::Default),
                        )
                        .one(txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?
                        .ok_or_else(|| {
                            AppError::Database(format!(
                                "User {} has no default collection",
                                inserted.created_by
                            ))
                        })?;

                    collection_media::ActiveModel {
                        collection_id: Set(default_collection.id),
                        media_id: Set(inserted.id),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                    Ok(inserted)
                })
            })
            .await;

        result.map_err(|e| match e {
            sea_orm::TransactionError::Connection(e) => AppError::Database(e.to_string()),
            sea_orm::TransactionError::Transaction(e) => e,
        })
    }

    /// List media visible to `viewer_id`, optionally restricted to rows
    /// carrying every tag in `tags`.
    ///
    /// Always grouped by media id so neither the share-join fan-out nor
    /// duplicate tag links can repeat a row; ordered by id so offset
    /// pagination is stable.
    pub async fn list_visible(
        &self,
        viewer_id: i64,
        visibility: Visibility,
        tags: Option<&[i64]>,
        offset: u64,
    ) -> AppResult<Vec<media::Model>> {
        let mut query = match visibility {
            Visibility::Own => Media::find().filter(media::Column::CreatedBy.eq(viewer_id)),
            Visibility::Shared => Media::find()
                .join(JoinType::InnerJoin, media::Relation::CollectionLinks.def())
                .join(
                    JoinType::InnerJoin,
                    collection_media::Relation::Collection.def(),
                )
                .join(JoinType::InnerJoin, collection::Relation::Shares.def())
                .filter(crate::entities::collection_share::Column::UserId.eq(viewer_id)),
            // Left joins keep self-owned media that sits in never-shared
            // collections; the OR picks up both halves of the union.
            Visibility::All => Media::find()
                .join(JoinType::LeftJoin, media::Relation::CollectionLinks.def())
                .join(
                    JoinType::LeftJoin,
                    collection_media::Relation::Collection.def(),
                )
                .join(JoinType::LeftJoin, collection::Relation::Shares.def())
                .filter(
                    Condition::any()
                        .add(media::Column::CreatedBy.eq(viewer_id))
                        .add(crate::entities::collection_share::Column::UserId.eq(viewer_id)),
                ),
        };

        query = query.group_by(media::Column::Id);

        if let Some(tag_ids) = tags {
            // Intersection: every requested tag must be linked. COUNT(DISTINCT)
            // keeps duplicate tag links from inflating the match count.
            query = query
                .join(JoinType::InnerJoin, media::Relation::TagLinks.def())
                .filter(tag_media::Column::TagId.is_in(tag_ids.iter().copied()))
                .having(
                    Expr::expr(Func::count_distinct(Expr::col((
                        crate::entities::TagMedia,
                        tag_media::Column::TagId,
                    ))))
                    .eq(tag_ids.len() as i64),
                );
        }

        query
            .order_by_asc(media::Column::Id)
            .limit(PAGE_SIZE)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_media(id: i64, hash: &str, created_by: i64) -> media::Model {
        media::Model {
            id,
            content_hash: hash.to_string(),
            media_type: "image/png".to_string(),
            width: 640,
            height: 480,
            duration_seconds: 0.0,
            size_bytes: 1024,
            created_at: chrono::Utc::now().into(),
            created_by,
        }
    }

    #[tokio::test]
    async fn test_find_by_hash_takes_first_row() {
        let first = test_media(1, "aabbcc1122", 1);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[first.clone()]])
                .into_connection(),
        );

        let repo = MediaRepository::new(db);
        let found = repo.find_by_hash("aabbcc1122").await.unwrap();
        assert_eq!(found, Some(first));
    }

    #[tokio::test]
    async fn test_get_by_hash_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<media::Model>::new()])
                .into_connection(),
        );

        let repo = MediaRepository::new(db);
        let err = repo.get_by_hash("0123456789").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_visible_orders_by_id_and_caps_page() {
        let rows = vec![test_media(1, "aa11bb22cc", 7), test_media(2, "dd33ee44ff", 7)];
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows.clone()])
            .into_connection();

        let conn = Arc::new(conn);
        let listed = {
            let repo = MediaRepository::new(Arc::clone(&conn));
            repo.list_visible(7, Visibility::Own, None, 0)
                .await
                .unwrap()
        };
        assert_eq!(listed, rows);

        let conn = Arc::try_unwrap(conn).unwrap();
        let sql = format!("{:?}", conn.into_transaction_log()[0]);
        assert!(sql.contains("ORDER BY"), "missing explicit order: {sql}");
        assert!(sql.contains("LIMIT"), "missing page cap: {sql}");
    }

    #[tokio::test]
    async fn test_list_visible_tag_filter_requires_every_tag() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<media::Model>::new()])
            .into_connection();

        let conn = Arc::new(conn);
        {
            let repo = MediaRepository::new(Arc::clone(&conn));
            repo.list_visible(7, Visibility::Own, Some(&[3, 4]), 0)
                .await
                .unwrap();
        }

        let conn = Arc::try_unwrap(conn).unwrap();
        let sql = format!("{:?}", conn.into_transaction_log()[0]);
        assert!(sql.contains("HAVING"), "missing HAVING clause: {sql}");
        assert!(
            sql.contains("COUNT(DISTINCT"),
            "intersection must count distinct tags: {sql}"
        );
    }
}
