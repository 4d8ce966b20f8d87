//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use mediarium_common::{MediaStore, SessionStore};
use mediarium_core::{LibraryService, MediaService, TagService, UserService};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub media_service: MediaService,
    pub library_service: LibraryService,
    pub tag_service: TagService,
    pub sessions: SessionStore,
    pub store: MediaStore,
}

/// Session middleware.
///
/// Resolves the session cookie to a user and stashes the model in request
/// extensions. Resolution also refreshes the sliding TTL, so any
/// authenticated request extends the session by an hour. A token whose user
/// no longer exists is destroyed instead of half-working.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value();
        match state.sessions.resolve(token).await {
            Ok(Some(user_id)) => match state.user_service.find(user_id).await {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(user);
                }
                Ok(None) => {
                    if let Err(e) = state.sessions.destroy(token).await {
                        tracing::warn!(error = %e, "Failed to destroy stale session");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load session user");
                }
            },
            Ok(None) => {} // Expired or unknown token; request proceeds anonymous
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
            }
        }
    }

    next.run(req).await
}
