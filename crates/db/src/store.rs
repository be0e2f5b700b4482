//! Postgres implementation of the `folio_core` store traits.
//!
//! [`PgStore::begin`] opens one `sqlx` transaction per engine operation;
//! every trait method runs on that transaction. Dropping a [`PgStoreTx`]
//! without committing rolls it back.

use async_trait::async_trait;
use folio_core::article::{Article, NewVersion, Version};
use folio_core::error::CoreError;
use folio_core::pagination::{PageRequest, Pagination};
use folio_core::status::VersionStatus;
use folio_core::store::{StatsStore, StoreTransaction, TagStatStore, VersionStore};
use folio_core::tag::{Tag, TagPairStat, TagStat};
use folio_core::types::Serial;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::classify_sqlx_error;
use crate::repositories::{ArticleRepo, TagRepo, TagStatRepo, VersionRepo};

/// Transactional store backed by a connection pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StatsStore for PgStore {
    type Tx = PgStoreTx;

    async fn begin(&self) -> Result<Self::Tx, CoreError> {
        let tx = self.pool.begin().await.map_err(classify_sqlx_error)?;
        Ok(PgStoreTx { tx })
    }
}

/// An open Postgres transaction.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl VersionStore for PgStoreTx {
    async fn insert_article(&mut self, serial: &str) -> Result<Article, CoreError> {
        ArticleRepo::create(&mut self.tx, serial)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn lock_article(&mut self, serial: &str) -> Result<Option<Article>, CoreError> {
        ArticleRepo::lock(&mut self.tx, serial)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn insert_version(&mut self, version: &NewVersion) -> Result<Version, CoreError> {
        VersionRepo::create(&mut self.tx, version)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn insert_version_tags(
        &mut self,
        version_serial: &str,
        tag_serials: &[Serial],
    ) -> Result<(), CoreError> {
        VersionRepo::add_tags(&mut self.tx, version_serial, tag_serials)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn latest_version_number(
        &mut self,
        article_serial: &str,
    ) -> Result<Option<i32>, CoreError> {
        VersionRepo::latest_version_number(&mut self.tx, article_serial)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn get_version_by_serial(&mut self, serial: &str) -> Result<Option<Version>, CoreError> {
        VersionRepo::find_by_serial_tx(&mut self.tx, serial)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn get_versions_by_status_and_article(
        &mut self,
        article_serial: &str,
        status: VersionStatus,
    ) -> Result<Vec<Version>, CoreError> {
        VersionRepo::list_by_status_and_article(&mut self.tx, article_serial, status)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn update_version_status(
        &mut self,
        article_serial: &str,
        version_serial: &str,
        status: VersionStatus,
    ) -> Result<(), CoreError> {
        let updated =
            VersionRepo::update_status(&mut self.tx, article_serial, version_serial, status)
                .await
                .map_err(classify_sqlx_error)?;
        if !updated {
            return Err(CoreError::not_found("Version", version_serial));
        }
        Ok(())
    }

    async fn soft_delete_article(&mut self, serial: &str) -> Result<bool, CoreError> {
        ArticleRepo::soft_delete(&mut self.tx, serial)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn soft_delete_versions_by_article(
        &mut self,
        article_serial: &str,
    ) -> Result<u64, CoreError> {
        VersionRepo::soft_delete_by_article(&mut self.tx, article_serial)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn update_tag_relationship_score(
        &mut self,
        version_serial: &str,
        score: f64,
    ) -> Result<(), CoreError> {
        let updated = VersionRepo::update_tag_relationship_score(&mut self.tx, version_serial, score)
            .await
            .map_err(classify_sqlx_error)?;
        if !updated {
            return Err(CoreError::not_found("Version", version_serial));
        }
        Ok(())
    }

    async fn total_published_article_count(&mut self) -> Result<i64, CoreError> {
        VersionRepo::count_published_articles(&mut self.tx)
            .await
            .map_err(classify_sqlx_error)
    }
}

#[async_trait]
impl TagStatStore for PgStoreTx {
    async fn insert_tag(&mut self, tag: &Tag) -> Result<(), CoreError> {
        TagRepo::create(&mut self.tx, tag)
            .await
            .map(|_| ())
            .map_err(classify_sqlx_error)
    }

    async fn existing_tag_serials(&mut self, serials: &[Serial]) -> Result<Vec<Serial>, CoreError> {
        TagRepo::existing_serials(&mut self.tx, serials)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn lock_tag_stats(&mut self, serials: &[Serial]) -> Result<Vec<TagStat>, CoreError> {
        TagStatRepo::lock_by_serials(&mut self.tx, serials)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn get_tag_stats_by_serials(
        &mut self,
        serials: &[Serial],
    ) -> Result<Vec<TagStat>, CoreError> {
        TagStatRepo::find_by_serials(&mut self.tx, serials)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn increment_usage_count(&mut self, serials: &[Serial]) -> Result<(), CoreError> {
        TagStatRepo::increment_usage(&mut self.tx, serials)
            .await
            .map(|_| ())
            .map_err(classify_sqlx_error)
    }

    async fn decrement_usage_count(&mut self, serials: &[Serial]) -> Result<(), CoreError> {
        TagStatRepo::decrement_usage(&mut self.tx, serials)
            .await
            .map(|_| ())
            .map_err(classify_sqlx_error)
    }

    async fn update_tag_stat(&mut self, serial: &str, trending_score: f64) -> Result<(), CoreError> {
        let updated = TagStatRepo::update_trending_score(&mut self.tx, serial, trending_score)
            .await
            .map_err(classify_sqlx_error)?;
        if !updated {
            return Err(CoreError::not_found("TagStat", serial));
        }
        Ok(())
    }

    async fn increment_tag_pair_stat(&mut self, tag1: &str, tag2: &str) -> Result<(), CoreError> {
        TagStatRepo::increment_pair(&mut self.tx, tag1, tag2)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn get_tag_pair_stats_by_serials(
        &mut self,
        serials: &[Serial],
    ) -> Result<Vec<TagPairStat>, CoreError> {
        TagStatRepo::pairs_by_serials(&mut self.tx, serials)
            .await
            .map_err(classify_sqlx_error)
    }

    async fn get_tag_stats_page(
        &mut self,
        page: PageRequest,
    ) -> Result<(Vec<TagStat>, Pagination), CoreError> {
        TagStatRepo::page(&mut self.tx, page)
            .await
            .map_err(classify_sqlx_error)
    }
}

#[async_trait]
impl StoreTransaction for PgStoreTx {
    async fn commit(self) -> Result<(), CoreError> {
        self.tx.commit().await.map_err(classify_sqlx_error)
    }

    async fn rollback(self) -> Result<(), CoreError> {
        self.tx.rollback().await.map_err(classify_sqlx_error)
    }
}
