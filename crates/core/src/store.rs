//! Storage capability traits consumed by the versioning engine.
//!
//! Every mutating operation opens exactly one transaction through
//! [`StatsStore::begin`] and threads the returned handle through each store
//! call. There is no non-transactional fallback: reads that feed a decision
//! (current status, published version, counts) happen on the same handle as
//! the writes they drive.
//!
//! Implementations: `folio_db::PgStore` (Postgres) and
//! [`MemoryStore`](crate::memory::MemoryStore) (tests).

use async_trait::async_trait;

use crate::article::{Article, NewVersion, Version};
use crate::error::CoreError;
use crate::pagination::{PageRequest, Pagination};
use crate::status::VersionStatus;
use crate::tag::{Tag, TagPairStat, TagStat};
use crate::types::Serial;

/// Article, version and version-tag access within a transaction.
#[async_trait]
pub trait VersionStore: Send {
    async fn insert_article(&mut self, serial: &str) -> Result<Article, CoreError>;

    /// Fetch an article (soft-deleted included) and hold a row lock on it
    /// until the transaction ends.
    async fn lock_article(&mut self, serial: &str) -> Result<Option<Article>, CoreError>;

    /// Insert a draft version. The returned version has no tags yet.
    async fn insert_version(&mut self, version: &NewVersion) -> Result<Version, CoreError>;

    async fn insert_version_tags(
        &mut self,
        version_serial: &str,
        tag_serials: &[Serial],
    ) -> Result<(), CoreError>;

    /// Highest version number assigned to the article, if any.
    async fn latest_version_number(&mut self, article_serial: &str)
        -> Result<Option<i32>, CoreError>;

    async fn get_version_by_serial(&mut self, serial: &str) -> Result<Option<Version>, CoreError>;

    async fn get_versions_by_status_and_article(
        &mut self,
        article_serial: &str,
        status: VersionStatus,
    ) -> Result<Vec<Version>, CoreError>;

    /// Persist a status change with `updated_at = now`. `published_at` is set
    /// when the new status is published and cleared otherwise.
    async fn update_version_status(
        &mut self,
        article_serial: &str,
        version_serial: &str,
        status: VersionStatus,
    ) -> Result<(), CoreError>;

    /// Mark the article deleted. Returns `false` when it was already deleted
    /// or does not exist.
    async fn soft_delete_article(&mut self, serial: &str) -> Result<bool, CoreError>;

    /// Move every version of the article to `deleted`, stamping `deleted_at`
    /// and clearing `published_at`. Returns the number of versions touched.
    async fn soft_delete_versions_by_article(&mut self, article_serial: &str)
        -> Result<u64, CoreError>;

    async fn update_tag_relationship_score(
        &mut self,
        version_serial: &str,
        score: f64,
    ) -> Result<(), CoreError>;

    /// Number of distinct non-deleted articles with a published version.
    async fn total_published_article_count(&mut self) -> Result<i64, CoreError>;
}

/// Tag, tag stat and tag-pair stat access within a transaction.
///
/// Counters are only ever changed through the increment/decrement methods;
/// callers never write a usage count they computed themselves.
#[async_trait]
pub trait TagStatStore: Send {
    /// Insert a tag together with its zeroed stat row.
    async fn insert_tag(&mut self, tag: &Tag) -> Result<(), CoreError>;

    /// Subset of `serials` that name existing tags.
    async fn existing_tag_serials(&mut self, serials: &[Serial]) -> Result<Vec<Serial>, CoreError>;

    /// Read the stat rows for `serials` and lock them, in serial order, until
    /// the transaction ends.
    async fn lock_tag_stats(&mut self, serials: &[Serial]) -> Result<Vec<TagStat>, CoreError>;

    async fn get_tag_stats_by_serials(&mut self, serials: &[Serial])
        -> Result<Vec<TagStat>, CoreError>;

    /// `usage_count += 1` and `usage_count_updated_at = now` for each serial.
    async fn increment_usage_count(&mut self, serials: &[Serial]) -> Result<(), CoreError>;

    /// `usage_count = max(usage_count - 1, 0)` and `usage_count_updated_at = now`.
    async fn decrement_usage_count(&mut self, serials: &[Serial]) -> Result<(), CoreError>;

    /// Persist a recomputed trending score with `trending_score_updated_at = now`.
    async fn update_tag_stat(&mut self, serial: &str, trending_score: f64)
        -> Result<(), CoreError>;

    /// Upsert the pair row in canonical order and add one to its count.
    async fn increment_tag_pair_stat(&mut self, tag1: &str, tag2: &str) -> Result<(), CoreError>;

    /// Pair rows whose both members are in `serials`.
    async fn get_tag_pair_stats_by_serials(
        &mut self,
        serials: &[Serial],
    ) -> Result<Vec<TagPairStat>, CoreError>;

    /// One page of stat rows ordered by tag serial, locked for update.
    async fn get_tag_stats_page(
        &mut self,
        page: PageRequest,
    ) -> Result<(Vec<TagStat>, Pagination), CoreError>;
}

/// An open transaction. Dropping it without calling [`commit`] discards
/// every change made through it.
///
/// [`commit`]: StoreTransaction::commit
#[async_trait]
pub trait StoreTransaction: VersionStore + TagStatStore + Sized {
    async fn commit(self) -> Result<(), CoreError>;
    async fn rollback(self) -> Result<(), CoreError>;
}

/// Entry point: a store that can open transactions.
#[async_trait]
pub trait StatsStore: Send + Sync {
    type Tx: StoreTransaction + 'static;

    async fn begin(&self) -> Result<Self::Tx, CoreError>;
}
