//! Versioning engine: article lifecycle operations and the status transition
//! state machine that keeps tag statistics consistent.
//!
//! Each public operation is one transaction. Validation happens before the
//! transaction opens; any error after that rolls back every statistic change
//! made by the operation.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::article::{CreateArticle, CreateArticleVersion, CreatedVersion, NewVersion, Version};
use crate::config::TagStatsConfig;
use crate::error::CoreError;
use crate::relationship::mean_relationship_score;
use crate::serial::{generate, SerialKind};
use crate::status::{classify, StatusCrossing, VersionStatus};
use crate::store::{StatsStore, StoreTransaction, TagStatStore, VersionStore};
use crate::tag::{dedup_serials, pair_combinations, CreateTag, Tag, TagStat};
use crate::trending::TrendingScoreCalculator;
use crate::types::Serial;

/// What a status transition request actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// Same status, or a change that does not cross the published boundary.
    /// Nothing was persisted.
    Unchanged,
    /// The version is now published; a previously published version of the
    /// same article, if any, was demoted to draft.
    Published { demoted_version_serial: Option<Serial> },
    /// The version left the published state.
    Unpublished { status: VersionStatus },
}

/// Result of [`VersioningEngine::delete_article`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedArticle {
    pub article_serial: Serial,
    pub deleted_versions: u64,
    /// The version that was published at deletion time, if any.
    pub unpublished_version_serial: Option<Serial>,
}

/// Orchestrates every write that touches tag statistics.
pub struct VersioningEngine<S> {
    store: S,
    config: TagStatsConfig,
    pub(crate) calculator: TrendingScoreCalculator,
}

impl<S: StatsStore> VersioningEngine<S> {
    /// Build an engine over `store`.
    ///
    /// Fails with [`CoreError::Validation`] when `config` does not pass
    /// [`TagStatsConfig::validate`]; a non-positive half-life would make
    /// every decayed score non-finite.
    pub fn new(store: S, config: TagStatsConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            calculator: TrendingScoreCalculator::new(config.trending_half_life_days),
            store,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &TagStatsConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    /// Create a tag and its zeroed stat row.
    pub async fn create_tag(&self, input: &CreateTag) -> Result<Tag, CoreError> {
        let name = input.normalized_name()?;
        let tag = Tag {
            serial: generate(SerialKind::Tag),
            name,
            created_at: Utc::now(),
        };

        let mut tx = self.store.begin().await?;
        let result = tx.insert_tag(&tag).await;
        settle(tx, result).await?;

        tracing::info!(tag_serial = %tag.serial, name = %tag.name, "Tag created");
        Ok(tag)
    }

    // -----------------------------------------------------------------------
    // Articles and versions
    // -----------------------------------------------------------------------

    /// Create an article with its first draft version. No statistics change.
    pub async fn create_article(
        &self,
        author_username: &str,
        input: &CreateArticle,
    ) -> Result<CreatedVersion, CoreError> {
        require_non_empty("author username", author_username)?;
        input.validate()?;
        let tag_serials = input.unique_tag_serials();

        let mut tx = self.store.begin().await?;
        let result = self
            .create_article_in_tx(&mut tx, author_username, input, tag_serials)
            .await;
        let created = settle(tx, result).await?;

        tracing::info!(
            article_serial = %created.article_serial,
            version_serial = %created.version.serial,
            author = %created.author_username,
            "Article created"
        );
        Ok(created)
    }

    async fn create_article_in_tx(
        &self,
        tx: &mut S::Tx,
        author_username: &str,
        input: &CreateArticle,
        tag_serials: Vec<Serial>,
    ) -> Result<CreatedVersion, CoreError> {
        ensure_tags_exist(tx, &tag_serials).await?;

        let article = tx.insert_article(&generate(SerialKind::Article)).await?;
        let new_version = NewVersion {
            serial: generate(SerialKind::Version),
            article_serial: article.serial.clone(),
            version_number: 1,
            author_username: author_username.to_string(),
            title: input.title.trim().to_string(),
            content: input.content.clone(),
        };
        let version = insert_version_with_tags(tx, &new_version, tag_serials).await?;

        Ok(CreatedVersion {
            article_serial: article.serial,
            author_username: author_username.to_string(),
            version,
        })
    }

    /// Append a new draft version numbered one past the article's latest.
    pub async fn create_article_version(
        &self,
        author_username: &str,
        article_serial: &str,
        input: &CreateArticleVersion,
    ) -> Result<CreatedVersion, CoreError> {
        require_non_empty("author username", author_username)?;
        require_non_empty("article serial", article_serial)?;
        input.validate()?;
        let tag_serials = input.unique_tag_serials();

        let mut tx = self.store.begin().await?;
        let result = self
            .create_version_in_tx(&mut tx, author_username, article_serial, input, tag_serials)
            .await;
        let created = settle(tx, result).await?;

        tracing::info!(
            article_serial,
            version_serial = %created.version.serial,
            version_number = created.version.version_number,
            "Article version created"
        );
        Ok(created)
    }

    async fn create_version_in_tx(
        &self,
        tx: &mut S::Tx,
        author_username: &str,
        article_serial: &str,
        input: &CreateArticleVersion,
        tag_serials: Vec<Serial>,
    ) -> Result<CreatedVersion, CoreError> {
        lock_live_article(tx, article_serial).await?;
        ensure_tags_exist(tx, &tag_serials).await?;

        let latest = tx.latest_version_number(article_serial).await?.unwrap_or(0);
        let new_version = NewVersion {
            serial: generate(SerialKind::Version),
            article_serial: article_serial.to_string(),
            version_number: latest + 1,
            author_username: author_username.to_string(),
            title: input.title.trim().to_string(),
            content: input.content.clone(),
        };
        let version = insert_version_with_tags(tx, &new_version, tag_serials).await?;

        Ok(CreatedVersion {
            article_serial: article_serial.to_string(),
            author_username: author_username.to_string(),
            version,
        })
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Move a version to `new_status`, applying the tag statistic side effects
    /// of crossing the published boundary.
    ///
    /// Requests that do not cross the boundary (same status, or e.g.
    /// `draft -> archived`) are no-ops and persist nothing.
    pub async fn transition_version_status(
        &self,
        article_serial: &str,
        version_serial: &str,
        new_status: &str,
    ) -> Result<TransitionOutcome, CoreError> {
        require_non_empty("article serial", article_serial)?;
        require_non_empty("version serial", version_serial)?;
        let new_status: VersionStatus = new_status.parse()?;

        let mut tx = self.store.begin().await?;
        let result = self
            .transition_in_tx(&mut tx, article_serial, version_serial, new_status)
            .await;
        let outcome = settle(tx, result).await?;

        match &outcome {
            TransitionOutcome::Unchanged => tracing::debug!(
                article_serial,
                version_serial,
                requested = %new_status,
                "Status transition is a no-op"
            ),
            TransitionOutcome::Published {
                demoted_version_serial,
            } => tracing::info!(
                article_serial,
                version_serial,
                demoted = ?demoted_version_serial,
                "Version published"
            ),
            TransitionOutcome::Unpublished { status } => tracing::info!(
                article_serial,
                version_serial,
                %status,
                "Version unpublished"
            ),
        }
        Ok(outcome)
    }

    async fn transition_in_tx(
        &self,
        tx: &mut S::Tx,
        article_serial: &str,
        version_serial: &str,
        new_status: VersionStatus,
    ) -> Result<TransitionOutcome, CoreError> {
        lock_live_article(tx, article_serial).await?;
        let version = tx
            .get_version_by_serial(version_serial)
            .await?
            .filter(|v| v.article_serial == article_serial && v.deleted_at.is_none())
            .ok_or_else(|| CoreError::not_found("Version", version_serial))?;

        if version.status == new_status {
            return Ok(TransitionOutcome::Unchanged);
        }

        let outcome = match classify(version.status, new_status) {
            StatusCrossing::None => return Ok(TransitionOutcome::Unchanged),
            StatusCrossing::Publish => {
                let demoted = tx
                    .get_versions_by_status_and_article(article_serial, VersionStatus::Published)
                    .await?
                    .into_iter()
                    .find(|p| p.serial != version.serial);

                let mut touched = version.tag_serials.clone();
                if let Some(previous) = &demoted {
                    touched.extend(previous.tag_serials.iter().cloned());
                }
                let before = tx.lock_tag_stats(&dedup_serials(&touched)).await?;

                if let Some(previous) = &demoted {
                    tx.decrement_usage_count(&previous.tag_serials).await?;
                }
                tx.increment_usage_count(&version.tag_serials).await?;
                self.recompute_trending(tx, &before).await?;

                // Demote first so at most one version is ever published.
                if let Some(previous) = &demoted {
                    tx.update_version_status(article_serial, &previous.serial, VersionStatus::Draft)
                        .await?;
                }
                tx.update_version_status(article_serial, version_serial, new_status)
                    .await?;

                TransitionOutcome::Published {
                    demoted_version_serial: demoted.map(|p| p.serial),
                }
            }
            StatusCrossing::Unpublish => {
                let before = tx.lock_tag_stats(&version.tag_serials).await?;
                tx.decrement_usage_count(&version.tag_serials).await?;
                self.recompute_trending(tx, &before).await?;
                tx.update_version_status(article_serial, version_serial, new_status)
                    .await?;

                TransitionOutcome::Unpublished { status: new_status }
            }
        };

        self.update_relationship_score(tx, &version).await?;
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Deletion
    // -----------------------------------------------------------------------

    /// Soft-delete an article and all of its versions, releasing the tag
    /// usage held by its published version.
    pub async fn delete_article(&self, article_serial: &str) -> Result<DeletedArticle, CoreError> {
        require_non_empty("article serial", article_serial)?;

        let mut tx = self.store.begin().await?;
        let result = self.delete_in_tx(&mut tx, article_serial).await;
        let deleted = settle(tx, result).await?;

        tracing::info!(
            article_serial,
            deleted_versions = deleted.deleted_versions,
            unpublished = ?deleted.unpublished_version_serial,
            "Article deleted"
        );
        Ok(deleted)
    }

    async fn delete_in_tx(
        &self,
        tx: &mut S::Tx,
        article_serial: &str,
    ) -> Result<DeletedArticle, CoreError> {
        lock_live_article(tx, article_serial).await?;

        let published = tx
            .get_versions_by_status_and_article(article_serial, VersionStatus::Published)
            .await?;
        let touched = dedup_serials(
            &published
                .iter()
                .flat_map(|v| v.tag_serials.iter().cloned())
                .collect::<Vec<_>>(),
        );
        let before = tx.lock_tag_stats(&touched).await?;

        let deleted_versions = tx.soft_delete_versions_by_article(article_serial).await?;
        if !tx.soft_delete_article(article_serial).await? {
            return Err(CoreError::not_found("Article", article_serial));
        }

        for version in &published {
            tx.decrement_usage_count(&version.tag_serials).await?;
        }
        self.recompute_trending(tx, &before).await?;

        Ok(DeletedArticle {
            article_serial: article_serial.to_string(),
            deleted_versions,
            unpublished_version_serial: published.into_iter().next().map(|v| v.serial),
        })
    }

    // -----------------------------------------------------------------------
    // Score maintenance
    // -----------------------------------------------------------------------

    /// Recompute trending scores for the tags in `before` from their current
    /// usage counts, decayed from the usage-count timestamp each row carried
    /// before this operation touched it.
    async fn recompute_trending(&self, tx: &mut S::Tx, before: &[TagStat]) -> Result<(), CoreError> {
        if before.is_empty() {
            return Ok(());
        }
        let previous: HashMap<&str, _> = before
            .iter()
            .map(|stat| (stat.tag_serial.as_str(), stat.usage_count_updated_at))
            .collect();
        let serials: Vec<Serial> = before.iter().map(|stat| stat.tag_serial.clone()).collect();

        let now = Utc::now();
        for stat in tx.get_tag_stats_by_serials(&serials).await? {
            let last_updated_at = previous
                .get(stat.tag_serial.as_str())
                .copied()
                .unwrap_or(stat.usage_count_updated_at);
            let score = self.calculator.score(stat.usage_count, last_updated_at, now);
            tx.update_tag_stat(&stat.tag_serial, score).await?;
        }
        Ok(())
    }

    /// Count the version's tag pairs as co-occurring once more and store the
    /// mean PPMI of its tag set.
    async fn update_relationship_score(
        &self,
        tx: &mut S::Tx,
        version: &Version,
    ) -> Result<(), CoreError> {
        let pairs = pair_combinations(&version.tag_serials);
        let score = if pairs.is_empty() {
            0.0
        } else {
            for (tag1, tag2) in &pairs {
                tx.increment_tag_pair_stat(tag1, tag2).await?;
            }
            let stats = tx.get_tag_stats_by_serials(&version.tag_serials).await?;
            let pair_stats = tx.get_tag_pair_stats_by_serials(&version.tag_serials).await?;
            let total = tx.total_published_article_count().await?;
            mean_relationship_score(&version.tag_serials, &stats, &pair_stats, total)?
        };
        tx.update_tag_relationship_score(&version.serial, score).await
    }
}

/// Commit on success, roll back on failure. Rollback errors are logged and
/// the original error is returned.
pub(crate) async fn settle<T, Tx: StoreTransaction>(
    tx: Tx,
    result: Result<T, CoreError>,
) -> Result<T, CoreError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(err)
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} is mandatory")));
    }
    Ok(())
}

async fn lock_live_article<Tx: VersionStore>(tx: &mut Tx, serial: &str) -> Result<(), CoreError> {
    tx.lock_article(serial)
        .await?
        .filter(|article| article.deleted_at.is_none())
        .map(|_| ())
        .ok_or_else(|| CoreError::not_found("Article", serial))
}

async fn ensure_tags_exist<Tx: TagStatStore>(
    tx: &mut Tx,
    tag_serials: &[Serial],
) -> Result<(), CoreError> {
    if tag_serials.is_empty() {
        return Ok(());
    }
    let existing = tx.existing_tag_serials(tag_serials).await?;
    match tag_serials.iter().find(|serial| !existing.contains(*serial)) {
        Some(missing) => Err(CoreError::not_found("Tag", missing.as_str())),
        None => Ok(()),
    }
}

async fn insert_version_with_tags<Tx: VersionStore>(
    tx: &mut Tx,
    new_version: &NewVersion,
    tag_serials: Vec<Serial>,
) -> Result<Version, CoreError> {
    let mut version = tx.insert_version(new_version).await?;
    if !tag_serials.is_empty() {
        tx.insert_version_tags(&version.serial, &tag_serials).await?;
    }
    version.tag_serials = tag_serials;
    Ok(version)
}
