//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Read-side methods accept `&PgPool`; methods that take part in a tag
//! statistics operation accept the open `&mut Transaction` instead and are
//! only called through [`PgStore`](crate::store::PgStore).

pub mod article_repo;
pub mod tag_repo;
pub mod tag_stat_repo;
pub mod user_repo;
pub mod version_repo;

pub use article_repo::ArticleRepo;
pub use tag_repo::TagRepo;
pub use tag_stat_repo::TagStatRepo;
pub use user_repo::UserRepo;
pub use version_repo::VersionRepo;

/// Transaction handle threaded through the write-side repository methods.
pub type PgTx<'c> = sqlx::Transaction<'c, sqlx::Postgres>;
