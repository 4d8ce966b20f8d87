//! User endpoints: registration and login.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use mediarium_common::AppResult;
use mediarium_core::CreateUserInput;
use serde::Deserialize;

use crate::{
    extractors::MaybeSessionUser,
    middleware::{AppState, SESSION_COOKIE},
    response::UserResponse,
};

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Register a new user.
///
/// Creates the user and their default collection, then signs the new user in.
async fn create_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CreateUserInput>,
) -> AppResult<impl IntoResponse> {
    let user = state.user_service.create(req).await?;
    let token = state.sessions.create(user.id).await?;

    Ok((
        StatusCode::CREATED,
        jar.add(session_cookie(token)),
        Json(UserResponse::from(user)),
    ))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Sign in with username and password.
///
/// A request that already carries a live session short-circuits to the
/// current identity without checking credentials.
async fn login(
    State(state): State<AppState>,
    MaybeSessionUser(current): MaybeSessionUser,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    if let Some(user) = current {
        return Ok((StatusCode::OK, jar, Json(UserResponse::from(user))));
    }

    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;
    let token = state.sessions.create(user.id).await?;

    Ok((
        StatusCode::OK,
        jar.add(session_cookie(token)),
        Json(UserResponse::from(user)),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/login", post(login))
}
