//! Scheduled trending refresh.
//!
//! Re-decays every tag's trending score on a fixed interval so scores keep
//! falling for tags nobody publishes with. The loop runs until its
//! [`CancellationToken`] is triggered; a failed sweep is logged and the next
//! tick tries again.

use std::sync::Arc;
use std::time::Duration;

use folio_core::config::TagStatsConfig;
use folio_core::store::StatsStore;
use folio_core::versioning::VersioningEngine;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default time between refresh sweeps: one hour.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub refresh_interval: Duration,
    pub tag_stats: TagStatsConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `TRENDING_REFRESH_INTERVAL_SECS` | `3600`  |
    ///
    /// Decay parameters come from [`TagStatsConfig::from_env`].
    pub fn from_env() -> Self {
        let interval_secs: u64 = std::env::var("TRENDING_REFRESH_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_INTERVAL_SECS.to_string())
            .parse()
            .expect("TRENDING_REFRESH_INTERVAL_SECS must be a valid u64");
        assert!(interval_secs > 0, "TRENDING_REFRESH_INTERVAL_SECS must be positive");

        let tag_stats = TagStatsConfig::from_env()
            .unwrap_or_else(|e| panic!("Invalid tag statistics configuration: {e}"));

        Self {
            refresh_interval: Duration::from_secs(interval_secs),
            tag_stats,
        }
    }
}

/// Sweep counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshLoopStats {
    pub succeeded: u64,
    pub failed: u64,
}

/// Run the trending refresh loop until `cancel` is triggered.
///
/// The first sweep runs immediately. Ticks missed while a sweep is still
/// running are skipped rather than replayed.
pub async fn run<S: StatsStore>(
    engine: Arc<VersioningEngine<S>>,
    refresh_interval: Duration,
    cancel: CancellationToken,
) -> RefreshLoopStats {
    tracing::info!(
        interval_secs = refresh_interval.as_secs(),
        "Trending refresh job started"
    );

    let mut stats = RefreshLoopStats::default();
    let mut interval = tokio::time::interval(refresh_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(
                    succeeded = stats.succeeded,
                    failed = stats.failed,
                    "Trending refresh job stopping"
                );
                break;
            }
            _ = interval.tick() => {
                match engine.refresh_all_trending_scores().await {
                    Ok(summary) => {
                        stats.succeeded += 1;
                        tracing::info!(
                            pages = summary.pages,
                            tags_updated = summary.tags_updated,
                            "Trending refresh: sweep complete"
                        );
                    }
                    Err(e) => {
                        stats.failed += 1;
                        tracing::error!(error = %e, "Trending refresh: sweep failed");
                    }
                }
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use folio_core::memory::MemoryStore;
    use folio_core::tag::CreateTag;

    use super::*;

    const TICK: Duration = Duration::from_millis(5);

    fn engine(store: MemoryStore) -> Arc<VersioningEngine<MemoryStore>> {
        Arc::new(VersioningEngine::new(store, TagStatsConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn stops_when_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = run(engine(MemoryStore::new()), TICK, cancel).await;
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn sweeps_refresh_trending_scores() {
        let store = MemoryStore::new();
        let engine = engine(store.clone());
        let tag = engine
            .create_tag(&CreateTag { name: "rust".into() })
            .await
            .unwrap();
        store.set_usage_count(&tag.serial, 3).await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(Arc::clone(&engine), TICK, cancel.clone()));
        tokio::time::sleep(Duration::from_millis(40)).await;
        cancel.cancel();
        let stats = handle.await.unwrap();

        assert!(stats.succeeded >= 1);
        assert_eq!(stats.failed, 0);
        let stat = store.tag_stat(&tag.serial).await.unwrap();
        assert!(stat.trending_score > 0.0);
    }

    #[tokio::test]
    async fn failed_sweep_does_not_stop_the_loop() {
        let store = MemoryStore::new();
        store.fail_on("get_tag_stats_page");
        let engine = engine(store.clone());

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(engine, TICK, cancel.clone()));
        tokio::time::sleep(Duration::from_millis(30)).await;
        store.clear_faults();
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        let stats = handle.await.unwrap();

        assert!(stats.failed >= 1, "faulted sweeps should be counted");
        assert!(stats.succeeded >= 1, "loop should recover once faults clear");
    }
}
