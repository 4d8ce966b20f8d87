//! Redis-backed derivation sink.
//!
//! Implements the core [`DerivationSink`] trait by pushing jobs onto an
//! apalis Redis queue for the derive worker to process.

use async_trait::async_trait;
use mediarium_common::{AppError, AppResult};
use mediarium_core::{DerivationSink, DeriveRequest};

use crate::jobs::DeriveJob;

/// Redis-backed derivation queue.
#[derive(Clone)]
pub struct RedisDerivationService {
    storage: apalis_redis::RedisStorage<DeriveJob>,
}

impl RedisDerivationService {
    /// Create a new Redis derivation service.
    #[must_use]
    pub const fn new(storage: apalis_redis::RedisStorage<DeriveJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl DerivationSink for RedisDerivationService {
    async fn enqueue(&self, request: DeriveRequest) -> AppResult<()> {
        use apalis::prelude::*;

        let job = DeriveJob::from(request);
        let media_id = job.media_id;

        self.storage
            .clone()
            .push(job)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to queue derivation job: {e}")))?;

        tracing::debug!(media_id, "Queued derivation job");
        Ok(())
    }
}
