//! Tag service.

use mediarium_common::AppResult;
use mediarium_db::{
    entities::tag,
    repositories::{TagRepository, TagSearch},
};
use serde::Deserialize;
use validator::Validate;

/// Maximum results returned from a tag search.
const SEARCH_LIMIT: u64 = 10;

/// Input for creating a tag.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagInput {
    #[validate(length(min = 1, max = 32))]
    pub namespace: String,

    #[validate(length(min = 1, max = 256))]
    pub tag_name: String,
}

/// Result of a get-or-create, distinguishing 200 from 201 at the API layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// The tag already existed.
    Existing(tag::Model),
    /// This request created the tag.
    Created(tag::Model),
}

/// Tag service for creation and search.
#[derive(Clone)]
pub struct TagService {
    tag_repo: TagRepository,
}

impl TagService {
    /// Create a new tag service.
    #[must_use]
    pub const fn new(tag_repo: TagRepository) -> Self {
        Self { tag_repo }
    }

    /// Get or create a USER tag for `(namespace, tagName)`.
    pub async fn get_or_create(&self, input: CreateTagInput) -> AppResult<TagOutcome> {
        input.validate()?;

        let (tag, created) = self
            .tag_repo
            .get_or_create(&input.namespace, &input.tag_name, tag::TagType::User)
            .await?;

        Ok(if created {
            TagOutcome::Created(tag)
        } else {
            TagOutcome::Existing(tag)
        })
    }

    /// Search tags by fragment, returning at most ten matches.
    ///
    /// A `namespace:name` search term splits into a namespace prefix and a
    /// name fragment; otherwise the whole term matches the name alone.
    pub async fn search(&self, term: &str, exclude: Vec<i64>) -> AppResult<Vec<tag::Model>> {
        let params = parse_search_term(term, exclude);
        self.tag_repo.search(&params, SEARCH_LIMIT).await
    }
}

fn parse_search_term(term: &str, exclude: Vec<i64>) -> TagSearch {
    match term.split_once(':') {
        Some((namespace, name)) => TagSearch {
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
            exclude,
        },
        None => TagSearch {
            namespace: None,
            name: term.to_string(),
            exclude,
        },
    }
}
