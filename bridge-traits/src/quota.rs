//! Storage Quota Abstraction
//!
//! Reports how much persistent storage the host grants the application.

use async_trait::async_trait;

use crate::error::Result;

/// A point-in-time storage estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageEstimate {
    /// Bytes currently used by the application's persistent stores.
    pub used_bytes: u64,
    /// Bytes still available before the host's quota is hit.
    pub available_bytes: u64,
}

/// Storage quota trait
///
/// The engine recomputes `used_bytes` from actual tier contents; the quota
/// primitive supplies the host's view of the remaining headroom so the status
/// object can report both.
#[async_trait]
pub trait StorageQuota: Send + Sync {
    /// Get the current usage/quota estimate.
    async fn estimate(&self) -> Result<StorageEstimate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_estimate() {
        let estimate = StorageEstimate {
            used_bytes: 2_052_096,
            available_bytes: 512 * 1024 * 1024,
        };

        assert_eq!(estimate.used_bytes, 2_052_096);
        assert!(estimate.available_bytes > estimate.used_bytes);
    }
}
