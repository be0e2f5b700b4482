//! Batch trending refresh: re-decay every tag's trending score by elapsed
//! time alone. Usage counts are never changed here.

use chrono::Utc;
use serde::Serialize;

use crate::error::CoreError;
use crate::pagination::PageRequest;
use crate::store::{StatsStore, TagStatStore};
use crate::versioning::{settle, VersioningEngine};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrendingRefreshSummary {
    pub pages: i64,
    pub tags_updated: u64,
}

impl<S: StatsStore> VersioningEngine<S> {
    /// Recompute and persist the trending score of every tag stat row.
    ///
    /// The whole sweep runs in one transaction; a failure on any page rolls
    /// back every page. Safe to run alongside transitions because each score
    /// is derived only from the row's current persisted count.
    pub async fn refresh_all_trending_scores(&self) -> Result<TrendingRefreshSummary, CoreError> {
        let mut tx = self.store().begin().await?;
        let result = self.refresh_in_tx(&mut tx).await;
        let summary = settle(tx, result).await?;

        tracing::info!(
            pages = summary.pages,
            tags_updated = summary.tags_updated,
            "Trending scores refreshed"
        );
        Ok(summary)
    }

    async fn refresh_in_tx(&self, tx: &mut S::Tx) -> Result<TrendingRefreshSummary, CoreError> {
        let page_size = self.config().refresh_page_size;
        let now = Utc::now();
        let mut summary = TrendingRefreshSummary::default();
        let mut page = 1;

        loop {
            let (stats, pagination) = tx
                .get_tag_stats_page(PageRequest::sweep(page, page_size))
                .await?;

            for stat in &stats {
                let score = self
                    .calculator
                    .score(stat.usage_count, stat.usage_count_updated_at, now);
                tx.update_tag_stat(&stat.tag_serial, score).await?;
                summary.tags_updated += 1;
            }
            if !stats.is_empty() {
                summary.pages += 1;
            }

            tracing::debug!(
                page,
                total_pages = pagination.total_pages,
                rows = stats.len(),
                "Refreshed trending page"
            );

            if pagination.is_last_page() {
                break;
            }
            page += 1;
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Duration;

    use super::*;
    use crate::article::CreateArticle;
    use crate::config::TagStatsConfig;
    use crate::memory::MemoryStore;
    use crate::tag::CreateTag;

    fn engine(page_size: i64) -> VersioningEngine<MemoryStore> {
        VersioningEngine::new(
            MemoryStore::new(),
            TagStatsConfig {
                refresh_page_size: page_size,
                ..TagStatsConfig::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn empty_table_terminates() {
        let summary = engine(10).refresh_all_trending_scores().await.unwrap();
        assert_eq!(summary, TrendingRefreshSummary::default());
    }

    #[tokio::test]
    async fn sweeps_every_page_and_decays_by_age() {
        let engine = engine(2);
        let mut serials = Vec::new();
        for name in ["a", "b", "c", "d", "e"] {
            let tag = engine
                .create_tag(&CreateTag { name: name.into() })
                .await
                .unwrap();
            serials.push(tag.serial);
        }

        let store = engine.store();
        store.set_usage_count(&serials[0], 10).await;
        store
            .set_usage_count_updated_at(&serials[0], Utc::now() - Duration::days(7))
            .await;
        store.set_usage_count(&serials[4], 3).await;

        let summary = engine.refresh_all_trending_scores().await.unwrap();
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.tags_updated, 5);

        let decayed = store.tag_stat(&serials[0]).await.unwrap();
        assert_eq!(decayed.usage_count, 10);
        assert!((decayed.trending_score - 5.0).abs() < 1e-3, "got {}", decayed.trending_score);

        let fresh = store.tag_stat(&serials[4]).await.unwrap();
        assert!((fresh.trending_score - 3.0).abs() < 1e-3);
        assert_eq!(store.tag_stat(&serials[1]).await.unwrap().trending_score, 0.0);
    }

    #[tokio::test]
    async fn refresh_is_idempotent_for_counts() {
        let engine = engine(100);
        let tag = engine
            .create_tag(&CreateTag { name: "rust".into() })
            .await
            .unwrap();
        let created = engine
            .create_article(
                "alice",
                &CreateArticle {
                    title: "t".into(),
                    content: "c".into(),
                    tag_serials: vec![tag.serial.clone()],
                },
            )
            .await
            .unwrap();
        engine
            .transition_version_status(&created.article_serial, &created.version.serial, "published")
            .await
            .unwrap();

        engine.refresh_all_trending_scores().await.unwrap();
        engine.refresh_all_trending_scores().await.unwrap();
        assert_eq!(engine.store().tag_stat(&tag.serial).await.unwrap().usage_count, 1);
    }

    #[tokio::test]
    async fn failing_page_rolls_back_the_whole_sweep() {
        let engine = engine(1);
        let tag = engine
            .create_tag(&CreateTag { name: "rust".into() })
            .await
            .unwrap();
        engine.store().set_usage_count(&tag.serial, 4).await;

        engine.store().fail_on("update_tag_stat");
        assert_matches!(
            engine.refresh_all_trending_scores().await,
            Err(CoreError::Storage(_))
        );
        assert_eq!(engine.store().tag_stat(&tag.serial).await.unwrap().trending_score, 0.0);
    }
}
