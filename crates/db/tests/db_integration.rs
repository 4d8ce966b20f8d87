//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `mediarium_test`)
//!   `TEST_DB_PASSWORD` (default: `mediarium_test`)
//!   `TEST_DB_NAME` (default: `mediarium_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use mediarium_common::AppError;
use mediarium_db::entities::{collection, media, tag};
use mediarium_db::repositories::{
    CollectionRepository, MediaRepository, TagRepository, UserRepository, Visibility, PAGE_SIZE,
};
use mediarium_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

fn media_row(hash: &str, user_id: i64) -> media::ActiveModel {
    media::ActiveModel {
        content_hash: Set(hash.to_string()),
        media_type: Set("image/png".to_string()),
        width: Set(640),
        height: Set(480),
        duration_seconds: Set(0.0),
        size_bytes: Set(1024),
        created_at: Set(chrono::Utc::now().into()),
        created_by: Set(user_id),
        ..Default::default()
    }
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(config.database_url().starts_with("postgres://"));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_registration_creates_exactly_one_default_collection() {
    let db = TestDatabase::new().await.unwrap();
    let conn = Arc::clone(&db.conn);

    let users = UserRepository::new(Arc::clone(&conn));
    let collections = CollectionRepository::new(Arc::clone(&conn));

    let user = users
        .create_with_default_collection("alice".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();

    let default = collections.find_default_for_user(user.id).await.unwrap();
    assert!(default.is_some());
    assert_eq!(
        default.unwrap().collection_type,
        collection::CollectionType::Default
    );

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_username_rejected_and_no_rows_created() {
    let db = TestDatabase::new().await.unwrap();
    let conn = Arc::clone(&db.conn);

    let users = UserRepository::new(Arc::clone(&conn));

    users
        .create_with_default_collection("bob".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();

    let err = users
        .create_with_default_collection("bob".to_string(), "$argon2id$other".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_content_keeps_two_rows_with_same_hash() {
    let db = TestDatabase::new().await.unwrap();
    let conn = Arc::clone(&db.conn);

    let users = UserRepository::new(Arc::clone(&conn));
    let media_repo = MediaRepository::new(Arc::clone(&conn));

    let a = users
        .create_with_default_collection("carol".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();
    let b = users
        .create_with_default_collection("dave".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();

    let hash = "a9993e364706816aba3e25717850c26c9cd0d89d";
    let first = media_repo.insert_linked(media_row(hash, a.id)).await.unwrap();
    let second = media_repo.insert_linked(media_row(hash, b.id)).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.content_hash, second.content_hash);
    assert_eq!(media_repo.count_by_hash(hash).await.unwrap(), 2);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_tag_intersection_excludes_partial_matches() {
    let db = TestDatabase::new().await.unwrap();
    let conn = Arc::clone(&db.conn);

    let users = UserRepository::new(Arc::clone(&conn));
    let media_repo = MediaRepository::new(Arc::clone(&conn));
    let tags = TagRepository::new(Arc::clone(&conn));

    let user = users
        .create_with_default_collection("erin".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();

    let both = media_repo
        .insert_linked(media_row("1111111111", user.id))
        .await
        .unwrap();
    let only_one = media_repo
        .insert_linked(media_row("2222222222", user.id))
        .await
        .unwrap();

    let (tag_a, _) = tags
        .get_or_create("genre", "drama", tag::TagType::User)
        .await
        .unwrap();
    let (tag_b, _) = tags
        .get_or_create("year", "2024", tag::TagType::User)
        .await
        .unwrap();

    tags.create_link(tag_a.id, both.id).await.unwrap();
    tags.create_link(tag_b.id, both.id).await.unwrap();
    tags.create_link(tag_a.id, only_one.id).await.unwrap();

    let listed = media_repo
        .list_visible(user.id, Visibility::Own, Some(&[tag_a.id, tag_b.id]), 0)
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, both.id);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_pagination_pages_do_not_overlap() {
    let db = TestDatabase::new().await.unwrap();
    let conn = Arc::clone(&db.conn);

    let users = UserRepository::new(Arc::clone(&conn));
    let media_repo = MediaRepository::new(Arc::clone(&conn));

    let user = users
        .create_with_default_collection("frank".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();

    for n in 0..150 {
        media_repo
            .insert_linked(media_row(&format!("{n:010x}"), user.id))
            .await
            .unwrap();
    }

    let first = media_repo
        .list_visible(user.id, Visibility::Own, None, 0)
        .await
        .unwrap();
    let second = media_repo
        .list_visible(user.id, Visibility::Own, None, PAGE_SIZE)
        .await
        .unwrap();

    assert_eq!(first.len(), PAGE_SIZE as usize);
    assert_eq!(second.len(), 50);

    let first_ids: std::collections::HashSet<i64> = first.iter().map(|m| m.id).collect();
    assert!(second.iter().all(|m| !first_ids.contains(&m.id)));

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_all_visibility_includes_own_and_shared_without_duplicates() {
    let db = TestDatabase::new().await.unwrap();
    let conn = Arc::clone(&db.conn);

    let users = UserRepository::new(Arc::clone(&conn));
    let media_repo = MediaRepository::new(Arc::clone(&conn));
    let collections = CollectionRepository::new(Arc::clone(&conn));

    let owner = users
        .create_with_default_collection("grace".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();
    let viewer = users
        .create_with_default_collection("heidi".to_string(), "$argon2id$stub".to_string())
        .await
        .unwrap();

    let shared_media = media_repo
        .insert_linked(media_row("3333333333", owner.id))
        .await
        .unwrap();
    let own_media = media_repo
        .insert_linked(media_row("4444444444", viewer.id))
        .await
        .unwrap();

    let owner_default = collections
        .find_default_for_user(owner.id)
        .await
        .unwrap()
        .unwrap();
    collections
        .create_share(owner_default.id, viewer.id)
        .await
        .unwrap();

    let listed = media_repo
        .list_visible(viewer.id, Visibility::All, None, 0)
        .await
        .unwrap();

    let ids: Vec<i64> = listed.iter().map(|m| m.id).collect();
    assert!(ids.contains(&shared_media.id));
    assert!(ids.contains(&own_media.id));
    assert_eq!(
        ids.len(),
        ids.iter().collect::<std::collections::HashSet<_>>().len(),
        "listing must not repeat media ids"
    );

    db.cleanup().await.unwrap();
}
