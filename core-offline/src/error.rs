use thiserror::Error;

use crate::unit::UnitId;
use core_store::StoreError;

/// Errors surfaced by the download orchestrator.
///
/// `Clone` because joiners of an in-flight download observe the same
/// completion as the caller that started it.
#[derive(Error, Debug, Clone)]
pub enum OfflineError {
    /// The network could not be reached.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// A reachable server answered with a non-success status.
    #[error("Fetch failed with status {status} for {url}")]
    FetchFailed { status: u16, url: String },

    /// The requested unit is not in the offline tier. Absence is an expected
    /// state for read APIs; this kind is for operations that require
    /// presence.
    #[error("Content unit not available offline: {0}")]
    NotFoundOffline(UnitId),

    /// A download failed after part of the unit was written; the partial
    /// data has been rolled back and the unit is absent.
    #[error("Download aborted, partial data rolled back: {0}")]
    PartialDownloadAborted(String),

    /// The host's storage quota would be exceeded.
    #[error("Storage quota exceeded: needed {needed} bytes, {available} available")]
    QuotaExceeded { needed: u64, available: u64 },

    /// Cache store failure outside the quota case.
    #[error("Cache store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for OfflineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::QuotaExceeded { needed, available } => {
                OfflineError::QuotaExceeded { needed, available }
            }
            other => OfflineError::Store(other.to_string()),
        }
    }
}

impl From<bridge_traits::BridgeError> for OfflineError {
    fn from(error: bridge_traits::BridgeError) -> Self {
        use bridge_traits::BridgeError;
        match error {
            BridgeError::NetworkUnavailable(message) => OfflineError::NetworkUnavailable(message),
            BridgeError::HttpStatus { status, url } => OfflineError::FetchFailed { status, url },
            other => OfflineError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, OfflineError>;
