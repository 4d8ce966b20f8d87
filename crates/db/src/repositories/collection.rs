//! Collection repository.

use std::sync::Arc;

use crate::entities::{collection, collection_share, Collection};
use mediarium_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

/// Collection repository for database operations.
#[derive(Clone)]
pub struct CollectionRepository {
    db: Arc<DatabaseConnection>,
}

impl CollectionRepository {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a collection by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<collection::Model>> {
        Collection::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a collection by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<collection::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Collection: {id}")))
    }

    /// Find a user's DEFAULT collection.
    pub async fn find_default_for_user(
        &self,
        owner_id: i64,
    ) -> AppResult<Option<collection::Model>> {
        Collection::find()
            .filter(collection::Column::OwnerId.eq(owner_id))
            .filter(collection::Column::CollectionType.eq(collection::CollectionType::Default))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Grant a user read access to a collection.
    pub async fn create_share(
        &self,
        collection_id: i64,
        user_id: i64,
    ) -> AppResult<collection_share::Model> {
        collection_share::ActiveModel {
            collection_id: Set(collection_id),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a collection is already shared with a user.
    pub async fn is_shared_with(&self, collection_id: i64, user_id: i64) -> AppResult<bool> {
        let existing = crate::entities::CollectionShare::find()
            .filter(collection_share::Column::CollectionId.eq(collection_id))
            .filter(collection_share::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(existing.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_default_for_user() {
        let default = collection::Model {
            id: 10,
            name: "Default Collection".to_string(),
            collection_type: collection::CollectionType::Default,
            owner_id: 3,
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[default.clone()]])
                .into_connection(),
        );

        let repo = CollectionRepository::new(db);
        let found = repo.find_default_for_user(3).await.unwrap();
        assert_eq!(found, Some(default));
    }

    #[tokio::test]
    async fn test_find_default_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<collection::Model>::new()])
                .into_connection(),
        );

        let repo = CollectionRepository::new(db);
        assert!(repo.find_default_for_user(3).await.unwrap().is_none());
    }
}
