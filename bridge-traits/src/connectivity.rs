//! Connectivity Monitoring Abstraction
//!
//! Provides the online/offline primitive the engine's status object mirrors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Connectivity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityState {
    /// Connected to a network
    Online,
    /// Not connected to any network
    Offline,
}

impl ConnectivityState {
    pub fn is_online(&self) -> bool {
        matches!(self, ConnectivityState::Online)
    }
}

/// Connectivity monitor trait
///
/// Reports whether the host currently has network access and notifies the
/// engine about transitions so the shared status object can be updated.
///
/// # Platform Support
///
/// - **Desktop**: system network APIs or active probing
/// - **Mobile shells**: ConnectivityManager / Network framework
/// - **Embedded webview**: navigator online/offline events
///
/// # Example
///
/// ```ignore
/// use bridge_traits::connectivity::ConnectivityMonitor;
///
/// async fn watch(monitor: &dyn ConnectivityMonitor) {
///     let mut stream = monitor.subscribe_changes().await.unwrap();
///     while let Some(state) = stream.next().await {
///         tracing::info!(?state, "connectivity changed");
///     }
/// }
/// ```
#[async_trait]
pub trait ConnectivityMonitor: Send + Sync {
    /// Get the current connectivity state.
    async fn state(&self) -> Result<ConnectivityState>;

    /// Check if currently online.
    async fn is_online(&self) -> bool {
        matches!(self.state().await, Ok(ConnectivityState::Online))
    }

    /// Subscribe to connectivity changes.
    ///
    /// Implementations should emit an item whenever the state transitions.
    async fn subscribe_changes(&self) -> Result<Box<dyn ConnectivityChangeStream>>;
}

/// Stream of connectivity state changes
#[async_trait]
pub trait ConnectivityChangeStream: Send {
    /// Get the next state transition.
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<ConnectivityState>;
}
