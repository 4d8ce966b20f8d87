//! HTTP API layer for mediarium.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: users, media, tags
//! - **Extractors**: session-based authentication
//! - **Middleware**: cookie session resolution with sliding expiration
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{session_middleware, AppState};
