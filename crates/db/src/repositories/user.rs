//! User repository.

use std::sync::Arc;

use crate::entities::{collection, user, User};
use mediarium_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User: {id}")))
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user together with their DEFAULT collection, atomically.
    ///
    /// The default collection must exist for every user from the moment the
    /// user row is visible, so both inserts share one transaction. A
    /// duplicate username surfaces as a 400, not a server error.
    pub async fn create_with_default_collection(
        &self,
        username: String,
        password_hash: String,
    ) -> AppResult<user::Model> {
        let result = self
            .db
            .transaction::<_, user::Model, sea_orm::DbErr>(|txn| {
                Box::pin(async move {
                    let user = user::ActiveModel {
                        username: Set(username),
                        password_hash: Set(password_hash),
                        created_at: Set(chrono::Utc::now().into()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    collection::ActiveModel {
                        name: Set("Default Collection".to_string()),
                        collection_type: Set(collection::CollectionType::Default),
                        owner_id: Set(user.id),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(user)
                })
            })
            .await;

        match result {
            Ok(user) => Ok(user),
            Err(sea_orm::TransactionError::Transaction(e))
                if matches!(
                    e.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) =>
            {
                Err(AppError::BadRequest(
                    "An account with that username already exists.".to_string(),
                ))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let user = test_user(1, "alice");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_username("alice").await.unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let err = repo.get_by_id(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
