//! Database repositories.

mod collection;
mod derivation_job;
mod media;
mod tag;
mod user;

pub use collection::CollectionRepository;
pub use derivation_job::DerivationJobRepository;
pub use media::{MediaRepository, Visibility, PAGE_SIZE};
pub use tag::{TagRepository, TagSearch};
pub use user::UserRepository;
