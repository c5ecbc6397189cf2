use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend refused a write because the host's storage quota would be
    /// exceeded.
    #[error("Storage quota exceeded: needed {needed} bytes, {available} available")]
    QuotaExceeded { needed: u64, available: u64 },

    /// The named tier does not exist in the backend.
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    /// Backend-specific failure.
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for quota-exhaustion failures, which callers roll back
    /// rather than retry.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
