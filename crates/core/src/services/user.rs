//! User service.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use mediarium_common::{AppError, AppResult};
use mediarium_db::{entities::user, repositories::UserRepository};
use serde::Deserialize;
use validator::Validate;

/// User service for registration and authentication.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 64))]
    pub username: String,

    #[validate(length(min = 1, max = 50))]
    pub password: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Register a new user.
    ///
    /// The user row and their DEFAULT collection are created in one
    /// transaction; a taken username surfaces as a 400 either from the
    /// pre-check or from the unique constraint when two registrations race.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "An account with that username already exists.".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        self.user_repo
            .create_with_default_collection(input.username, password_hash)
            .await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: i64) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Find a user by ID.
    pub async fn find(&self, id: i64) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_id(id).await
    }

    /// Authenticate a user by username and password.
    ///
    /// Wrong username and wrong password return the same error so the
    /// response never reveals which half was wrong.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("The username or password is incorrect.".to_string())
            })?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::BadRequest(
                "The username or password is incorrect.".to_string(),
            ));
        }

        Ok(user)
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: i64, username: &str, password: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_rejects_taken_username() {
        let existing = create_test_user(1, "alice", "pw");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let err = service
            .create(CreateUserInput {
                username: "alice".to_string(),
                password: "pw123".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = UserService::new(UserRepository::new(db));
        let err = service
            .create(CreateUserInput {
                username: String::new(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let existing = create_test_user(1, "bob", "correct");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let err = service.authenticate("bob", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user_same_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let err = service.authenticate("nobody", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
