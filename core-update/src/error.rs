use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum UpdateError {
    /// `apply_update` was invoked with no installed build waiting to take
    /// control; nothing was sent.
    #[error("No installed build is waiting to take control")]
    NothingWaiting,

    /// The waiting worker did not acknowledge the skip-waiting instruction
    /// in time. The reload proceeds anyway; this kind is informational.
    #[error("Update handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The worker registry could not be queried.
    #[error("Worker registry error: {0}")]
    Registry(String),

    /// The page reload could not be scheduled.
    #[error("Page reload failed: {0}")]
    Reload(String),
}

pub type Result<T> = std::result::Result<T, UpdateError>;
