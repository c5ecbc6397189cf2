use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` if the failure means the network could not be reached,
    /// as opposed to a reachable server returning an error.
    pub fn is_network_unavailable(&self) -> bool {
        matches!(self, BridgeError::NetworkUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
