//! In-memory implementation of the store traits.
//!
//! Transactions are copy-on-begin: `begin` takes the store-wide lock and
//! clones the state, writes go to the clone, and `commit` swaps it back in.
//! Dropping or rolling back a transaction discards the clone. Holding the
//! lock for the whole transaction serializes writers, which stands in for
//! the row locks a relational store would take.
//!
//! Individual operations can be made to fail with [`MemoryStore::fail_on`]
//! to exercise rollback paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::article::{Article, NewVersion, Version};
use crate::error::CoreError;
use crate::pagination::{PageRequest, Pagination};
use crate::status::VersionStatus;
use crate::store::{StatsStore, StoreTransaction, TagStatStore, VersionStore};
use crate::tag::{canonical_pair, Tag, TagPairStat, TagStat};
use crate::types::{Serial, Timestamp};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    articles: BTreeMap<Serial, Article>,
    versions: BTreeMap<Serial, Version>,
    tags: BTreeMap<Serial, Tag>,
    tag_stats: BTreeMap<Serial, TagStat>,
    pair_stats: BTreeMap<(Serial, Serial), TagPairStat>,
}

/// Shared handle; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<StdMutex<HashSet<&'static str>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call to the named store operation fail with
    /// [`CoreError::Storage`]. Names match the trait method names.
    pub fn fail_on(&self, operation: &'static str) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(operation);
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.clear();
        }
    }

    pub async fn article(&self, serial: &str) -> Option<Article> {
        self.state.lock().await.articles.get(serial).cloned()
    }

    pub async fn version(&self, serial: &str) -> Option<Version> {
        self.state.lock().await.versions.get(serial).cloned()
    }

    pub async fn versions_of(&self, article_serial: &str) -> Vec<Version> {
        let state = self.state.lock().await;
        let mut versions: Vec<Version> = state
            .versions
            .values()
            .filter(|v| v.article_serial == article_serial)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version_number);
        versions
    }

    pub async fn tag_stat(&self, tag_serial: &str) -> Option<TagStat> {
        self.state.lock().await.tag_stats.get(tag_serial).cloned()
    }

    pub async fn pair_stat(&self, tag1: &str, tag2: &str) -> Option<TagPairStat> {
        let (a, b) = canonical_pair(tag1, tag2);
        self.state
            .lock()
            .await
            .pair_stats
            .get(&(a.to_string(), b.to_string()))
            .cloned()
    }

    /// Backdate a tag's last usage-count change, e.g. to test decay.
    pub async fn set_usage_count_updated_at(&self, tag_serial: &str, at: Timestamp) {
        if let Some(stat) = self.state.lock().await.tag_stats.get_mut(tag_serial) {
            stat.usage_count_updated_at = at;
        }
    }

    /// Overwrite a tag's usage count directly, bypassing the counters.
    pub async fn set_usage_count(&self, tag_serial: &str, usage_count: i64) {
        if let Some(stat) = self.state.lock().await.tag_stats.get_mut(tag_serial) {
            stat.usage_count = usage_count;
        }
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, CoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTransaction {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// Open transaction over a [`MemoryStore`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<StdMutex<HashSet<&'static str>>>,
}

impl MemoryTransaction {
    fn check(&self, operation: &'static str) -> Result<(), CoreError> {
        let injected = self
            .faults
            .lock()
            .map(|faults| faults.contains(operation))
            .unwrap_or(false);
        if injected {
            return Err(CoreError::Storage(format!("injected failure in {operation}")));
        }
        Ok(())
    }

    fn stats_for(&self, serials: &[Serial]) -> Vec<TagStat> {
        let wanted: HashSet<&str> = serials.iter().map(String::as_str).collect();
        self.working
            .tag_stats
            .values()
            .filter(|stat| wanted.contains(stat.tag_serial.as_str()))
            .cloned()
            .collect()
    }

    fn unique<'a>(serials: &'a [Serial]) -> HashSet<&'a str> {
        serials.iter().map(String::as_str).collect()
    }
}

#[async_trait]
impl VersionStore for MemoryTransaction {
    async fn insert_article(&mut self, serial: &str) -> Result<Article, CoreError> {
        self.check("insert_article")?;
        if self.working.articles.contains_key(serial) {
            return Err(CoreError::Conflict(format!("article {serial} already exists")));
        }
        let now = Utc::now();
        let article = Article {
            serial: serial.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.working
            .articles
            .insert(article.serial.clone(), article.clone());
        Ok(article)
    }

    async fn lock_article(&mut self, serial: &str) -> Result<Option<Article>, CoreError> {
        self.check("lock_article")?;
        Ok(self.working.articles.get(serial).cloned())
    }

    async fn insert_version(&mut self, version: &NewVersion) -> Result<Version, CoreError> {
        self.check("insert_version")?;
        if !self.working.articles.contains_key(&version.article_serial) {
            return Err(CoreError::Validation(format!(
                "article {} does not exist",
                version.article_serial
            )));
        }
        let duplicate_number = self.working.versions.values().any(|v| {
            v.article_serial == version.article_serial && v.version_number == version.version_number
        });
        if duplicate_number {
            return Err(CoreError::Conflict(format!(
                "version {} of article {} already exists",
                version.version_number, version.article_serial
            )));
        }

        let now = Utc::now();
        let created = Version {
            serial: version.serial.clone(),
            article_serial: version.article_serial.clone(),
            version_number: version.version_number,
            author_username: version.author_username.clone(),
            title: version.title.clone(),
            content: version.content.clone(),
            status: VersionStatus::Draft,
            tag_serials: Vec::new(),
            tag_relationship_score: 0.0,
            created_at: now,
            updated_at: now,
            published_at: None,
            deleted_at: None,
        };
        self.working
            .versions
            .insert(created.serial.clone(), created.clone());
        Ok(created)
    }

    async fn insert_version_tags(
        &mut self,
        version_serial: &str,
        tag_serials: &[Serial],
    ) -> Result<(), CoreError> {
        self.check("insert_version_tags")?;
        if let Some(missing) = tag_serials
            .iter()
            .find(|serial| !self.working.tags.contains_key(*serial))
        {
            return Err(CoreError::Validation(format!("tag {missing} does not exist")));
        }
        let version = self
            .working
            .versions
            .get_mut(version_serial)
            .ok_or_else(|| CoreError::not_found("Version", version_serial))?;
        for serial in tag_serials {
            if !version.tag_serials.contains(serial) {
                version.tag_serials.push(serial.clone());
            }
        }
        Ok(())
    }

    async fn latest_version_number(
        &mut self,
        article_serial: &str,
    ) -> Result<Option<i32>, CoreError> {
        self.check("latest_version_number")?;
        Ok(self
            .working
            .versions
            .values()
            .filter(|v| v.article_serial == article_serial)
            .map(|v| v.version_number)
            .max())
    }

    async fn get_version_by_serial(&mut self, serial: &str) -> Result<Option<Version>, CoreError> {
        self.check("get_version_by_serial")?;
        Ok(self.working.versions.get(serial).cloned())
    }

    async fn get_versions_by_status_and_article(
        &mut self,
        article_serial: &str,
        status: VersionStatus,
    ) -> Result<Vec<Version>, CoreError> {
        self.check("get_versions_by_status_and_article")?;
        Ok(self
            .working
            .versions
            .values()
            .filter(|v| v.article_serial == article_serial && v.status == status)
            .cloned()
            .collect())
    }

    async fn update_version_status(
        &mut self,
        article_serial: &str,
        version_serial: &str,
        status: VersionStatus,
    ) -> Result<(), CoreError> {
        self.check("update_version_status")?;
        if status.is_published() {
            let other_published = self.working.versions.values().any(|v| {
                v.article_serial == article_serial
                    && v.serial != version_serial
                    && v.status.is_published()
            });
            if other_published {
                return Err(CoreError::Conflict(format!(
                    "article {article_serial} already has a published version"
                )));
            }
        }

        let version = self
            .working
            .versions
            .get_mut(version_serial)
            .filter(|v| v.article_serial == article_serial)
            .ok_or_else(|| CoreError::not_found("Version", version_serial))?;
        let now = Utc::now();
        version.status = status;
        version.updated_at = now;
        version.published_at = status.is_published().then_some(now);
        Ok(())
    }

    async fn soft_delete_article(&mut self, serial: &str) -> Result<bool, CoreError> {
        self.check("soft_delete_article")?;
        match self.working.articles.get_mut(serial) {
            Some(article) if article.deleted_at.is_none() => {
                let now = Utc::now();
                article.deleted_at = Some(now);
                article.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_delete_versions_by_article(
        &mut self,
        article_serial: &str,
    ) -> Result<u64, CoreError> {
        self.check("soft_delete_versions_by_article")?;
        let now = Utc::now();
        let mut touched = 0;
        for version in self
            .working
            .versions
            .values_mut()
            .filter(|v| v.article_serial == article_serial)
        {
            version.status = VersionStatus::Deleted;
            version.deleted_at = Some(now);
            version.updated_at = now;
            version.published_at = None;
            touched += 1;
        }
        Ok(touched)
    }

    async fn update_tag_relationship_score(
        &mut self,
        version_serial: &str,
        score: f64,
    ) -> Result<(), CoreError> {
        self.check("update_tag_relationship_score")?;
        let version = self
            .working
            .versions
            .get_mut(version_serial)
            .ok_or_else(|| CoreError::not_found("Version", version_serial))?;
        version.tag_relationship_score = score;
        Ok(())
    }

    async fn total_published_article_count(&mut self) -> Result<i64, CoreError> {
        self.check("total_published_article_count")?;
        let articles: HashSet<&str> = self
            .working
            .versions
            .values()
            .filter(|v| v.status.is_published())
            .filter(|v| {
                self.working
                    .articles
                    .get(&v.article_serial)
                    .is_some_and(|a| a.deleted_at.is_none())
            })
            .map(|v| v.article_serial.as_str())
            .collect();
        Ok(articles.len() as i64)
    }
}

#[async_trait]
impl TagStatStore for MemoryTransaction {
    async fn insert_tag(&mut self, tag: &Tag) -> Result<(), CoreError> {
        self.check("insert_tag")?;
        if self.working.tags.values().any(|t| t.name == tag.name) {
            return Err(CoreError::Conflict(format!("tag '{}' already exists", tag.name)));
        }
        self.working.tags.insert(tag.serial.clone(), tag.clone());
        self.working.tag_stats.insert(
            tag.serial.clone(),
            TagStat {
                tag_serial: tag.serial.clone(),
                usage_count: 0,
                trending_score: 0.0,
                usage_count_updated_at: tag.created_at,
                trending_score_updated_at: tag.created_at,
            },
        );
        Ok(())
    }

    async fn existing_tag_serials(&mut self, serials: &[Serial]) -> Result<Vec<Serial>, CoreError> {
        self.check("existing_tag_serials")?;
        Ok(serials
            .iter()
            .filter(|serial| self.working.tags.contains_key(*serial))
            .cloned()
            .collect())
    }

    async fn lock_tag_stats(&mut self, serials: &[Serial]) -> Result<Vec<TagStat>, CoreError> {
        self.check("lock_tag_stats")?;
        Ok(self.stats_for(serials))
    }

    async fn get_tag_stats_by_serials(
        &mut self,
        serials: &[Serial],
    ) -> Result<Vec<TagStat>, CoreError> {
        self.check("get_tag_stats_by_serials")?;
        Ok(self.stats_for(serials))
    }

    async fn increment_usage_count(&mut self, serials: &[Serial]) -> Result<(), CoreError> {
        self.check("increment_usage_count")?;
        let now = Utc::now();
        for serial in Self::unique(serials) {
            if let Some(stat) = self.working.tag_stats.get_mut(serial) {
                stat.usage_count += 1;
                stat.usage_count_updated_at = now;
            }
        }
        Ok(())
    }

    async fn decrement_usage_count(&mut self, serials: &[Serial]) -> Result<(), CoreError> {
        self.check("decrement_usage_count")?;
        let now = Utc::now();
        for serial in Self::unique(serials) {
            if let Some(stat) = self.working.tag_stats.get_mut(serial) {
                stat.usage_count = (stat.usage_count - 1).max(0);
                stat.usage_count_updated_at = now;
            }
        }
        Ok(())
    }

    async fn update_tag_stat(&mut self, serial: &str, trending_score: f64) -> Result<(), CoreError> {
        self.check("update_tag_stat")?;
        let stat = self
            .working
            .tag_stats
            .get_mut(serial)
            .ok_or_else(|| CoreError::not_found("TagStat", serial))?;
        stat.trending_score = trending_score;
        stat.trending_score_updated_at = Utc::now();
        Ok(())
    }

    async fn increment_tag_pair_stat(&mut self, tag1: &str, tag2: &str) -> Result<(), CoreError> {
        self.check("increment_tag_pair_stat")?;
        let (a, b) = canonical_pair(tag1, tag2);
        self.working
            .pair_stats
            .entry((a.to_string(), b.to_string()))
            .and_modify(|pair| pair.usage_count += 1)
            .or_insert_with(|| TagPairStat {
                tag1_serial: a.to_string(),
                tag2_serial: b.to_string(),
                usage_count: 1,
            });
        Ok(())
    }

    async fn get_tag_pair_stats_by_serials(
        &mut self,
        serials: &[Serial],
    ) -> Result<Vec<TagPairStat>, CoreError> {
        self.check("get_tag_pair_stats_by_serials")?;
        let wanted = Self::unique(serials);
        Ok(self
            .working
            .pair_stats
            .values()
            .filter(|pair| {
                wanted.contains(pair.tag1_serial.as_str()) && wanted.contains(pair.tag2_serial.as_str())
            })
            .cloned()
            .collect())
    }

    async fn get_tag_stats_page(
        &mut self,
        page: PageRequest,
    ) -> Result<(Vec<TagStat>, Pagination), CoreError> {
        self.check("get_tag_stats_page")?;
        let total = self.working.tag_stats.len() as i64;
        let rows = self
            .working
            .tag_stats
            .values()
            .skip(page.offset().max(0) as usize)
            .take(page.limit().max(0) as usize)
            .cloned()
            .collect();
        Ok((rows, page.paginate(total)))
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self) -> Result<(), CoreError> {
        self.check("commit")?;
        let MemoryTransaction {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), CoreError> {
        self.check("rollback")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(serial: &str, name: &str) -> Tag {
        Tag {
            serial: serial.into(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_tag(&tag("TAG1", "rust")).await.unwrap();
        }
        assert!(store.tag_stat("TAG1").await.is_none());

        let mut tx = store.begin().await.unwrap();
        tx.insert_tag(&tag("TAG1", "rust")).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.tag_stat("TAG1").await.unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn decrement_floors_at_zero() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_tag(&tag("TAG1", "rust")).await.unwrap();
        let serials = vec!["TAG1".to_string()];
        tx.increment_usage_count(&serials).await.unwrap();
        tx.decrement_usage_count(&serials).await.unwrap();
        tx.decrement_usage_count(&serials).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.tag_stat("TAG1").await.unwrap().usage_count, 0);
    }

    #[tokio::test]
    async fn pair_stats_are_canonical() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.increment_tag_pair_stat("TAGb", "TAGa").await.unwrap();
        tx.increment_tag_pair_stat("TAGa", "TAGb").await.unwrap();
        tx.commit().await.unwrap();

        let pair = store.pair_stat("TAGb", "TAGa").await.unwrap();
        assert_eq!(pair.tag1_serial, "TAGa");
        assert_eq!(pair.usage_count, 2);
    }

    #[tokio::test]
    async fn duplicate_tag_name_conflicts() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_tag(&tag("TAG1", "rust")).await.unwrap();
        let err = tx.insert_tag(&tag("TAG2", "rust")).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn injected_faults_fail_the_named_operation() {
        let store = MemoryStore::new();
        store.fail_on("insert_tag");
        let mut tx = store.begin().await.unwrap();
        let err = tx.insert_tag(&tag("TAG1", "rust")).await.unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));

        store.clear_faults();
        tx.insert_tag(&tag("TAG1", "rust")).await.unwrap();
    }
}
