use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    /// Shell persistence failed during install. The install as a whole fails
    /// so the broken worker never becomes active.
    #[error("Install failed: {0}")]
    InstallFailed(String),

    /// Activation could not complete (tier enumeration or page claim).
    #[error("Activate failed: {0}")]
    ActivateFailed(String),

    /// Lifecycle method called out of order.
    #[error("Invalid worker state: expected {expected}, was {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Cache store error: {0}")]
    Store(#[from] core_store::StoreError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
