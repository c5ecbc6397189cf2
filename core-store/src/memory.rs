//! In-memory cache store backend.
//!
//! Used by tests and ephemeral sessions. An optional byte capacity makes the
//! backend refuse writes the way a quota-constrained host would.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{Result, StoreError};
use crate::store::{CacheStore, EntryMeta, StoredEntry};
use crate::tier::TierName;

#[derive(Debug, Clone)]
struct MemoryEntry {
    data: Bytes,
    stored_at: chrono::DateTime<Utc>,
}

/// In-memory backend keyed by tier name.
pub struct MemoryStore {
    tiers: RwLock<HashMap<String, HashMap<String, MemoryEntry>>>,
    capacity_bytes: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tiers: RwLock::new(HashMap::new()),
            capacity_bytes: None,
        }
    }

    /// A store that refuses writes once total payload bytes would exceed
    /// `capacity_bytes`.
    pub fn with_capacity(capacity_bytes: u64) -> Self {
        Self {
            tiers: RwLock::new(HashMap::new()),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    fn used_bytes(tiers: &HashMap<String, HashMap<String, MemoryEntry>>) -> u64 {
        tiers
            .values()
            .flat_map(|entries| entries.values())
            .map(|entry| entry.data.len() as u64)
            .sum()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, tier: &TierName, key: &str) -> Result<Option<StoredEntry>> {
        let tiers = self.tiers.read();
        Ok(tiers.get(tier.as_str()).and_then(|entries| {
            entries.get(key).map(|entry| StoredEntry {
                data: entry.data.clone(),
                stored_at: entry.stored_at,
            })
        }))
    }

    async fn put(&self, tier: &TierName, key: &str, data: Bytes) -> Result<()> {
        let mut tiers = self.tiers.write();

        if let Some(capacity) = self.capacity_bytes {
            let replaced = tiers
                .get(tier.as_str())
                .and_then(|entries| entries.get(key))
                .map(|entry| entry.data.len() as u64)
                .unwrap_or(0);
            let used = Self::used_bytes(&tiers) - replaced;
            let needed = data.len() as u64;
            if used + needed > capacity {
                return Err(StoreError::QuotaExceeded {
                    needed,
                    available: capacity.saturating_sub(used),
                });
            }
        }

        tiers.entry(tier.as_str().to_string()).or_default().insert(
            key.to_string(),
            MemoryEntry {
                data,
                stored_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete(&self, tier: &TierName, key: &str) -> Result<bool> {
        let mut tiers = self.tiers.write();
        Ok(tiers
            .get_mut(tier.as_str())
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn entries(&self, tier: &TierName) -> Result<Vec<EntryMeta>> {
        let tiers = self.tiers.read();
        Ok(tiers
            .get(tier.as_str())
            .map(|entries| {
                entries
                    .iter()
                    .map(|(key, entry)| EntryMeta {
                        key: key.clone(),
                        size_bytes: entry.data.len() as u64,
                        stored_at: entry.stored_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear(&self, tier: &TierName) -> Result<()> {
        let mut tiers = self.tiers.write();
        if let Some(entries) = tiers.get_mut(tier.as_str()) {
            entries.clear();
        }
        Ok(())
    }

    async fn list_tiers(&self) -> Result<Vec<TierName>> {
        let tiers = self.tiers.read();
        Ok(tiers.keys().map(TierName::from_raw).collect())
    }

    async fn drop_tier(&self, tier: &TierName) -> Result<()> {
        let mut tiers = self.tiers.write();
        tiers.remove(tier.as_str());
        Ok(())
    }
}
