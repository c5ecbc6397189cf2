//! The backend trait, the retention-aware tier handle, and stale-epoch
//! cleanup.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::tier::{RetentionPolicy, TierName, TierSet};

/// A stored blob plus the timestamp the backend recorded for it.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub data: Bytes,
    pub stored_at: DateTime<Utc>,
}

/// Entry metadata without the payload, for enumeration and pruning.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub key: String,
    pub size_bytes: u64,
    pub stored_at: DateTime<Utc>,
}

/// Pluggable key/blob backend.
///
/// Any persistent store supporting retrieve-by-key, enumerate-keys,
/// delete-by-key, and total-size reporting qualifies; no on-disk format is
/// mandated. Tiers are independent namespaces; operations on a tier that was
/// never written observe an empty tier rather than an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Retrieve an entry.
    async fn get(&self, tier: &TierName, key: &str) -> Result<Option<StoredEntry>>;

    /// Store an entry, replacing any previous value for the key.
    ///
    /// Surfaces [`StoreError::QuotaExceeded`](crate::StoreError::QuotaExceeded)
    /// when the write would exceed the host's storage quota.
    async fn put(&self, tier: &TierName, key: &str, data: Bytes) -> Result<()>;

    /// Delete an entry. Returns `true` if something was removed.
    async fn delete(&self, tier: &TierName, key: &str) -> Result<bool>;

    /// Enumerate entry metadata for a tier.
    async fn entries(&self, tier: &TierName) -> Result<Vec<EntryMeta>>;

    /// Enumerate keys for a tier.
    async fn keys(&self, tier: &TierName) -> Result<Vec<String>> {
        Ok(self
            .entries(tier)
            .await?
            .into_iter()
            .map(|meta| meta.key)
            .collect())
    }

    /// Remove every entry in a tier, keeping the tier itself.
    async fn clear(&self, tier: &TierName) -> Result<()>;

    /// Total payload bytes stored in a tier.
    async fn total_size(&self, tier: &TierName) -> Result<u64> {
        Ok(self
            .entries(tier)
            .await?
            .iter()
            .map(|meta| meta.size_bytes)
            .sum())
    }

    /// Enumerate every tier name known to the backend.
    async fn list_tiers(&self) -> Result<Vec<TierName>>;

    /// Delete a tier and all of its entries.
    async fn drop_tier(&self, tier: &TierName) -> Result<()>;
}

/// A named tier bound to a backend, applying its retention policy.
#[derive(Clone)]
pub struct Tier {
    store: Arc<dyn CacheStore>,
    name: TierName,
    retention: RetentionPolicy,
}

impl Tier {
    pub fn new(store: Arc<dyn CacheStore>, name: TierName, retention: RetentionPolicy) -> Self {
        Self {
            store,
            name,
            retention,
        }
    }

    pub fn name(&self) -> &TierName {
        &self.name
    }

    /// Retrieve an entry, treating anything older than `max_age` as a miss.
    ///
    /// Expired entries are deleted on the way out so they stop counting
    /// toward tier size.
    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let Some(entry) = self.store.get(&self.name, key).await? else {
            return Ok(None);
        };

        if let Some(max_age) = self.retention.max_age {
            let age = Utc::now().signed_duration_since(entry.stored_at);
            if age >= chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX) {
                debug!(tier = %self.name, key, "expired entry read as miss");
                self.store.delete(&self.name, key).await?;
                return Ok(None);
            }
        }

        Ok(Some(entry.data))
    }

    /// Store an entry, then prune oldest-first past `max_entries`.
    ///
    /// A failed prune of one entry is logged and does not fail the write or
    /// abort pruning of the remaining candidates.
    pub async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        self.store.put(&self.name, key, data).await?;

        let Some(max_entries) = self.retention.max_entries else {
            return Ok(());
        };

        let mut entries = self.store.entries(&self.name).await?;
        if entries.len() <= max_entries {
            return Ok(());
        }

        entries.sort_by_key(|meta| meta.stored_at);
        let excess = entries.len() - max_entries;
        for meta in entries.into_iter().take(excess) {
            if meta.key == key {
                // Never prune the entry that was just written.
                continue;
            }
            if let Err(error) = self.store.delete(&self.name, &meta.key).await {
                warn!(tier = %self.name, key = %meta.key, %error, "failed to prune entry");
            } else {
                debug!(tier = %self.name, key = %meta.key, "pruned entry past max_entries");
            }
        }

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.store.delete(&self.name, key).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear(&self.name).await
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        self.store.keys(&self.name).await
    }

    pub async fn total_size(&self) -> Result<u64> {
        self.store.total_size(&self.name).await
    }
}

/// Delete every tier whose name is not in the current epoch's set.
///
/// Returns the names that were dropped. A failed deletion is logged and must
/// not abort cleanup of the remaining stale tiers.
pub async fn drop_stale_tiers(store: &Arc<dyn CacheStore>, current: &TierSet) -> Result<Vec<TierName>> {
    let mut dropped = Vec::new();

    for name in store.list_tiers().await? {
        if current.contains(&name) {
            continue;
        }
        match store.drop_tier(&name).await {
            Ok(()) => {
                debug!(tier = %name, "dropped stale tier");
                dropped.push(name);
            }
            Err(error) => {
                warn!(tier = %name, %error, "failed to drop stale tier; continuing cleanup");
            }
        }
    }

    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::tier::{TierKind, TierSpec};
    use std::time::Duration;

    fn tier(store: &Arc<dyn CacheStore>, retention: RetentionPolicy) -> Tier {
        Tier::new(
            Arc::clone(store),
            TierName::new(TierKind::Video, "v1"),
            retention,
        )
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let tier = tier(&store, RetentionPolicy::unbounded());

        tier.put("/media/loop.mp4", Bytes::from_static(b"frames"))
            .await
            .unwrap();

        assert_eq!(
            tier.get("/media/loop.mp4").await.unwrap(),
            Some(Bytes::from_static(b"frames"))
        );
        assert_eq!(tier.get("/media/other.mp4").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_max_entries_prunes_oldest_first() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let tier = tier(&store, RetentionPolicy::unbounded().with_max_entries(2));

        tier.put("a", Bytes::from_static(b"1")).await.unwrap();
        tier.put("b", Bytes::from_static(b"2")).await.unwrap();
        tier.put("c", Bytes::from_static(b"3")).await.unwrap();

        let mut keys = tier.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_zero_max_age_reads_as_miss_and_evicts() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let tier = tier(
            &store,
            RetentionPolicy::unbounded().with_max_age(Duration::ZERO),
        );

        tier.put("a", Bytes::from_static(b"1")).await.unwrap();
        assert_eq!(tier.get("a").await.unwrap(), None);
        assert!(tier.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_stale_tiers_keeps_current_epoch() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let old = TierName::new(TierKind::Pages, "v1");
        let current = TierName::new(TierKind::Pages, "v2");
        store.put(&old, "k", Bytes::from_static(b"old")).await.unwrap();
        store
            .put(&current, "k", Bytes::from_static(b"new"))
            .await
            .unwrap();

        let set = TierSet::new("v2", vec![TierSpec::unbounded(TierKind::Pages)]);
        let dropped = drop_stale_tiers(&store, &set).await.unwrap();

        assert_eq!(dropped, vec![old.clone()]);
        let remaining = store.list_tiers().await.unwrap();
        assert!(remaining.contains(&current));
        assert!(!remaining.contains(&old));
    }
}
