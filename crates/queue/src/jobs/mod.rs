//! Job definitions.

#![allow(missing_docs)]

mod derive;

pub use derive::DeriveJob;
