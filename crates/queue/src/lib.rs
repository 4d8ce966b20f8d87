//! Background job queue for mediarium.
//!
//! This crate provides asynchronous derivation of thumbnail and subtitle
//! assets using Redis:
//!
//! - **Jobs**: serialized derivation requests
//! - **Workers**: concurrent job execution with Apalis
//! - **Retry**: bounded exponential backoff; terminal failures land on the
//!   derivation job row

pub mod jobs;
pub mod retry;
pub mod sink;
pub mod workers;

pub use jobs::DeriveJob;
pub use retry::RetryConfig;
pub use sink::RedisDerivationService;
pub use workers::{derive_worker, DeriveContext};
