//! Filesystem-backed cache store.
//!
//! One directory per tier, two files per entry: `<fingerprint>.bin` holds
//! the payload, `<fingerprint>.key` holds the original key (fingerprints are
//! SHA-256 of the key, so arbitrary keys map to safe filenames). Entry
//! timestamps come from file modification times. No further on-disk format
//! is imposed.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;

use core_store::{CacheStore, EntryMeta, Result, StoreError, StoredEntry, TierName};

const DATA_EXT: &str = "bin";
const KEY_EXT: &str = "key";

/// POSIX "no space left on device"; surfaced as the distinct quota error.
const ENOSPC: i32 = 28;

/// Filesystem-backed blob store rooted at one directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The conventional per-user data location for `app_name`.
    pub fn default_root(app_name: &str) -> Option<PathBuf> {
        dirs::data_dir().map(|data| data.join(app_name).join("tiers"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tier_dir(&self, tier: &TierName) -> PathBuf {
        self.root.join(tier.as_str())
    }

    fn fingerprint(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn data_path(&self, tier: &TierName, key: &str) -> PathBuf {
        self.tier_dir(tier)
            .join(format!("{}.{DATA_EXT}", Self::fingerprint(key)))
    }

    fn key_path(&self, tier: &TierName, key: &str) -> PathBuf {
        self.tier_dir(tier)
            .join(format!("{}.{KEY_EXT}", Self::fingerprint(key)))
    }

    fn map_write_error(error: std::io::Error) -> StoreError {
        if error.raw_os_error() == Some(ENOSPC) {
            StoreError::QuotaExceeded {
                needed: 0,
                available: 0,
            }
        } else {
            StoreError::Io(error)
        }
    }

    async fn stored_at(path: &Path) -> Result<DateTime<Utc>> {
        let metadata = tokio::fs::metadata(path).await?;
        let modified = metadata.modified()?;
        Ok(DateTime::<Utc>::from(modified))
    }
}

#[async_trait]
impl CacheStore for FsStore {
    async fn get(&self, tier: &TierName, key: &str) -> Result<Option<StoredEntry>> {
        let path = self.data_path(tier, key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(StoredEntry {
                data: Bytes::from(data),
                stored_at: Self::stored_at(&path).await?,
            })),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn put(&self, tier: &TierName, key: &str, data: Bytes) -> Result<()> {
        let dir = self.tier_dir(tier);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(Self::map_write_error)?;
        tokio::fs::write(self.data_path(tier, key), &data)
            .await
            .map_err(Self::map_write_error)?;
        tokio::fs::write(self.key_path(tier, key), key.as_bytes())
            .await
            .map_err(Self::map_write_error)?;
        Ok(())
    }

    async fn delete(&self, tier: &TierName, key: &str) -> Result<bool> {
        let existed = match tokio::fs::remove_file(self.data_path(tier, key)).await {
            Ok(()) => true,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => false,
            Err(error) => return Err(error.into()),
        };
        if let Err(error) = tokio::fs::remove_file(self.key_path(tier, key)).await {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(%error, "orphaned key file left behind");
            }
        }
        Ok(existed)
    }

    async fn entries(&self, tier: &TierName) -> Result<Vec<EntryMeta>> {
        let dir = self.tier_dir(tier);
        let mut read_dir = match tokio::fs::read_dir(&dir).await {
            Ok(read_dir) => read_dir,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(error) => return Err(error.into()),
        };

        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir.next_entry().await? {
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(KEY_EXT) {
                continue;
            }
            let key = tokio::fs::read_to_string(&path).await?;
            let data_path = path.with_extension(DATA_EXT);
            let metadata = match tokio::fs::metadata(&data_path).await {
                Ok(metadata) => metadata,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                    warn!(?data_path, "key file without payload; skipping");
                    continue;
                }
                Err(error) => return Err(error.into()),
            };
            entries.push(EntryMeta {
                key,
                size_bytes: metadata.len(),
                stored_at: DateTime::<Utc>::from(metadata.modified()?),
            });
        }
        Ok(entries)
    }

    async fn clear(&self, tier: &TierName) -> Result<()> {
        let dir = self.tier_dir(tier);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }
        tokio::fs::create_dir_all(&dir).await?;
        Ok(())
    }

    async fn list_tiers(&self) -> Result<Vec<TierName>> {
        let mut read_dir = match tokio::fs::read_dir(&self.root).await {
            Ok(read_dir) => read_dir,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(error) => return Err(error.into()),
        };

        let mut tiers = Vec::new();
        while let Some(dir_entry) = read_dir.next_entry().await? {
            if dir_entry.file_type().await?.is_dir() {
                if let Some(name) = dir_entry.file_name().to_str() {
                    tiers.push(TierName::from_raw(name));
                }
            }
        }
        Ok(tiers)
    }

    async fn drop_tier(&self, tier: &TierName) -> Result<()> {
        match tokio::fs::remove_dir_all(self.tier_dir(tier)).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_store::TierKind;

    fn name() -> TierName {
        TierName::new(TierKind::Shell, "v1")
    }

    #[tokio::test]
    async fn test_round_trip_and_enumeration() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store
            .put(&name(), "/index.html", Bytes::from_static(b"<html>"))
            .await
            .unwrap();
        store
            .put(&name(), "/app.js", Bytes::from_static(b"js"))
            .await
            .unwrap();

        let entry = store.get(&name(), "/index.html").await.unwrap().unwrap();
        assert_eq!(entry.data, Bytes::from_static(b"<html>"));

        let mut keys = store.keys(&name()).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["/app.js".to_string(), "/index.html".to_string()]);
        assert_eq!(store.total_size(&name()).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_missing_tier_and_missing_key_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert!(store.get(&name(), "/nope").await.unwrap().is_none());
        assert!(store.entries(&name()).await.unwrap().is_empty());
        assert!(!store.delete(&name(), "/nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_tier_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        let old = TierName::new(TierKind::Pages, "v1");
        store.put(&old, "/a", Bytes::from_static(b"x")).await.unwrap();
        store.put(&name(), "/b", Bytes::from_static(b"y")).await.unwrap();

        let mut tiers = store.list_tiers().await.unwrap();
        tiers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(tiers, vec![old.clone(), name()]);

        store.drop_tier(&old).await.unwrap();
        assert_eq!(store.list_tiers().await.unwrap(), vec![name()]);
        // Dropping a missing tier is a no-op.
        store.drop_tier(&old).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_keeps_tier_but_empties_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store.put(&name(), "/a", Bytes::from_static(b"x")).await.unwrap();
        store.clear(&name()).await.unwrap();

        assert!(store.entries(&name()).await.unwrap().is_empty());
        assert_eq!(store.list_tiers().await.unwrap(), vec![name()]);
    }
}
