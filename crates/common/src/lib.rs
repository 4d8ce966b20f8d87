//! Common utilities and shared types for mediarium.
//!
//! This crate provides foundational components used across all mediarium crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Content hashing**: Streaming SHA-1 digests via [`hash_file`]
//! - **Sessions**: Redis-backed cookie sessions via [`SessionStore`]
//! - **Storage**: Content-addressed blob placement via [`MediaStore`]
//! - **Tokens**: Session token generation via [`TokenGenerator`]

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use hash::{hash_bytes, hash_file, is_valid_hash};
pub use id::TokenGenerator;
pub use session::{SessionStore, SESSION_TTL};
pub use storage::MediaStore;
