//! Storage quota from the filesystem.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::quota::{StorageEstimate, StorageQuota};

/// Quota estimates for a store rooted at one directory: used bytes from real
/// file sizes under the root, available bytes from the filesystem.
pub struct FsQuota {
    root: PathBuf,
}

impl FsQuota {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir_size(path: &Path) -> std::io::Result<u64> {
        if !path.exists() {
            return Ok(0);
        }
        let mut total = 0;
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_dir() {
                total += Self::dir_size(&entry.path())?;
            } else {
                total += metadata.len();
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl StorageQuota for FsQuota {
    async fn estimate(&self) -> Result<StorageEstimate> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let used_bytes = Self::dir_size(&root)?;
            // Free space is queried on the nearest existing ancestor so a
            // not-yet-created store root still reports a quota.
            let mut probe = root.as_path();
            while !probe.exists() {
                probe = probe.parent().unwrap_or(Path::new("/"));
            }
            let available_bytes = fs2::available_space(probe)?;
            Ok::<_, std::io::Error>(StorageEstimate {
                used_bytes,
                available_bytes,
            })
        })
        .await
        .map_err(|error| BridgeError::OperationFailed(format!("quota task: {error}")))?
        .map_err(BridgeError::Io)
    }
}
