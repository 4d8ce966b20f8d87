//! Core business logic for mediarium.

pub mod services;

pub use services::*;
