//! Library service: listing and sharing.

use mediarium_common::{AppError, AppResult};
use mediarium_db::{
    entities::media,
    repositories::{CollectionRepository, MediaRepository, UserRepository, Visibility},
};
use serde::Deserialize;

/// Input for a listing request.
#[derive(Debug, Deserialize)]
pub struct ListMediaInput {
    /// Listing scope.
    #[serde(rename = "type")]
    pub visibility: Visibility,
    /// When present, only media carrying every one of these tags matches.
    pub tags: Option<Vec<i64>>,
    /// Zero-based row offset, defaults to 0.
    pub offset: Option<u64>,
}

/// Library service for visibility-scoped queries and share grants.
#[derive(Clone)]
pub struct LibraryService {
    media_repo: MediaRepository,
    collection_repo: CollectionRepository,
    user_repo: UserRepository,
}

impl LibraryService {
    /// Create a new library service.
    #[must_use]
    pub const fn new(
        media_repo: MediaRepository,
        collection_repo: CollectionRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            media_repo,
            collection_repo,
            user_repo,
        }
    }

    /// List media visible to the viewer. Page size is fixed at 100 rows,
    /// ordered by media id.
    pub async fn list(&self, viewer_id: i64, input: ListMediaInput) -> AppResult<Vec<media::Model>> {
        if let Some(ref tags) = input.tags {
            if tags.is_empty() {
                return Err(AppError::Validation(
                    "tags must not be empty when present".to_string(),
                ));
            }
            if tags.iter().any(|&id| id <= 0) {
                return Err(AppError::Validation(
                    "tags must be positive tag ids".to_string(),
                ));
            }
        }

        self.media_repo
            .list_visible(
                viewer_id,
                input.visibility,
                input.tags.as_deref(),
                input.offset.unwrap_or(0),
            )
            .await
    }

    /// Grant a user read access to a collection owned by the viewer.
    pub async fn share(
        &self,
        viewer_id: i64,
        collection_id: i64,
        user_id: i64,
    ) -> AppResult<()> {
        let collection = self.collection_repo.get_by_id(collection_id).await?;
        if collection.owner_id != viewer_id {
            return Err(AppError::Forbidden("Not your collection".to_string()));
        }

        self.user_repo.get_by_id(user_id).await?;

        // Re-granting is a no-op rather than a duplicate row
        if self
            .collection_repo
            .is_shared_with(collection_id, user_id)
            .await?
        {
            return Ok(());
        }

        self.collection_repo
            .create_share(collection_id, user_id)
            .await?;
        Ok(())
    }
}
