//! Business logic services.

#![allow(missing_docs)]

pub mod library;
pub mod media;
pub mod probe;
pub mod tag;
pub mod user;

pub use library::{LibraryService, ListMediaInput};
pub use media::{
    DerivationQueue, DerivationSink, DeriveRequest, MediaService, NoOpDerivationSink, UploadInput,
};
pub use probe::{MediaCategory, MediaProbe, ProbeOutcome};
pub use tag::{CreateTagInput, TagOutcome, TagService};
pub use user::{CreateUserInput, UserService};
