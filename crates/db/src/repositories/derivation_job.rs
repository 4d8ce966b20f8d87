//! Derivation job repository.

use std::sync::Arc;

use crate::entities::{derivation_job, DerivationJob};
use mediarium_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

/// Derivation job repository for database operations.
#[derive(Clone)]
pub struct DerivationJobRepository {
    db: Arc<DatabaseConnection>,
}

impl DerivationJobRepository {
    /// Create a new derivation job repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a PENDING job for a media row.
    pub async fn create_pending(&self, media_id: i64) -> AppResult<derivation_job::Model> {
        derivation_job::ActiveModel {
            media_id: Set(media_id),
            status: Set(derivation_job::DerivationStatus::Pending),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a job by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<derivation_job::Model> {
        DerivationJob::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("DerivationJob: {id}")))
    }

    /// Find the most recent job for a media row.
    pub async fn find_by_media(&self, media_id: i64) -> AppResult<Option<derivation_job::Model>> {
        DerivationJob::find()
            .filter(derivation_job::Column::MediaId.eq(media_id))
            .order_by_desc(derivation_job::Column::Id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a job RUNNING and bump its attempt counter.
    pub async fn mark_running(&self, id: i64) -> AppResult<derivation_job::Model> {
        let job = self.get_by_id(id).await?;
        let attempts = job.attempts + 1;

        let mut active: derivation_job::ActiveModel = job.into();
        active.status = Set(derivation_job::DerivationStatus::Running);
        active.attempts = Set(attempts);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a job DONE.
    pub async fn mark_done(&self, id: i64) -> AppResult<derivation_job::Model> {
        let job = self.get_by_id(id).await?;

        let mut active: derivation_job::ActiveModel = job.into();
        active.status = Set(derivation_job::DerivationStatus::Done);
        active.last_error = Set(None);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a job FAILED, recording the error for operators.
    pub async fn mark_failed(&self, id: i64, error: &str) -> AppResult<derivation_job::Model> {
        let job = self.get_by_id(id).await?;

        let mut active: derivation_job::ActiveModel = job.into();
        active.status = Set(derivation_job::DerivationStatus::Failed);
        active.last_error = Set(Some(error.to_string()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
