//! API integration tests.
//!
//! These run the router against a mock database and exercise the
//! boundary-validation and auth paths that never reach Postgres or Redis.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    Router,
};
use fred::clients::Client as RedisClient;
use mediarium_api::{router as api_router, session_middleware, AppState};
use mediarium_common::{MediaStore, SessionStore};
use mediarium_core::{
    LibraryService, MediaProbe, MediaService, NoOpDerivationSink, TagService, UserService,
};
use mediarium_db::repositories::{
    CollectionRepository, DerivationJobRepository, MediaRepository, TagRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn create_mock_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn create_test_state(db: DatabaseConnection, root: &std::path::Path) -> AppState {
    let db = Arc::new(db);
    let store = MediaStore::new(root);

    // Unconnected client: these tests never resolve a session cookie
    let redis = Arc::new(RedisClient::new(
        fred::types::config::Config::default(),
        None,
        None,
        None,
    ));

    let user_repo = UserRepository::new(Arc::clone(&db));
    let media_repo = MediaRepository::new(Arc::clone(&db));
    let collection_repo = CollectionRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let job_repo = DerivationJobRepository::new(Arc::clone(&db));

    AppState {
        user_service: UserService::new(user_repo.clone()),
        media_service: MediaService::new(
            media_repo.clone(),
            tag_repo.clone(),
            job_repo,
            MediaProbe::new(Duration::from_secs(5)),
            store.clone(),
            Arc::new(NoOpDerivationSink),
        ),
        library_service: LibraryService::new(media_repo, collection_repo, user_repo),
        tag_service: TagService::new(tag_repo),
        sessions: SessionStore::new(redis, "test".to_string()),
        store,
    }
}

fn create_app(db: DatabaseConnection, root: &std::path::Path) -> Router {
    let state = create_test_state(db, root);
    api_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_create_user_rejects_empty_username() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(create_mock_db(), dir.path());

    let response = app
        .oneshot(json_request(
            "/users",
            r#"{"username": "", "password": "hunter2"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_media_list_requires_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(create_mock_db(), dir.path());

    let response = app
        .oneshot(json_request("/media/list", r#"{"type": "Self"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_media_upload_requires_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(create_mock_db(), dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/media/upload")
                .header("content-type", "multipart/form-data; boundary=x")
                .body(Body::from("--x--\r\n"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_download_rejects_malformed_hash() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(create_mock_db(), dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/download/zzzz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_unknown_hash_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<mediarium_db::entities::media::Model>::new()])
        .into_connection();
    let app = create_app(db, dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/download/a9993e364706816aba3e25717850c26c9cd0d89d")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_tag_rejects_oversized_namespace() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(create_mock_db(), dir.path());

    let body = format!(
        r#"{{"namespace": "{}", "tagName": "x"}}"#,
        "n".repeat(33)
    );
    let response = app.oneshot(json_request("/tags", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_subtitle_rejects_zero_index() {
    let dir = tempfile::tempdir().unwrap();
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_app(db, dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/media/downloadSubtitle/a9993e364706816aba3e25717850c26c9cd0d89d/0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_app(create_mock_db(), dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/definitely/not/here")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
