//! Database entities.

pub mod collection;
pub mod collection_media;
pub mod collection_share;
pub mod derivation_job;
pub mod media;
pub mod tag;
pub mod tag_media;
pub mod user;

pub use collection::Entity as Collection;
pub use collection_media::Entity as CollectionMedia;
pub use collection_share::Entity as CollectionShare;
pub use derivation_job::Entity as DerivationJob;
pub use media::Entity as Media;
pub use tag::Entity as Tag;
pub use tag_media::Entity as TagMedia;
pub use user::Entity as User;
