//! API endpoints.

mod media;
mod tags;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/media", media::router())
        .nest("/tags", tags::router())
}
