//! Job workers.

mod derive;

pub use derive::{derive_worker, DeriveContext};
