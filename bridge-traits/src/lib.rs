//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the offline engine and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be provided differently per host (desktop,
//! mobile shell, embedded webview).
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`FetchClient`](fetch::FetchClient) - Async HTTP fetch with timeouts
//! - [`ConnectivityMonitor`](connectivity::ConnectivityMonitor) - Online/offline state and change stream
//!
//! ### Storage
//! - [`StorageQuota`](quota::StorageQuota) - Used/available persistent storage bytes
//!
//! ### Worker Coordination
//! - [`WorkerRegistry`](worker::WorkerRegistry) - Waiting/controlling build queries and the acknowledged skip-waiting instruction
//! - [`PageHost`](worker::PageHost) - Page reload and claim on the page side of the handoff
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert host-specific errors to
//! `BridgeError` and provide actionable messages. A fetch implementation must
//! report an unreachable network as
//! [`BridgeError::NetworkUnavailable`](error::BridgeError::NetworkUnavailable)
//! so the core can distinguish "offline" from "server said no".
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod connectivity;
pub mod error;
pub mod fetch;
pub mod quota;
pub mod worker;

pub use error::BridgeError;

// Re-export commonly used types
pub use connectivity::{ConnectivityChangeStream, ConnectivityMonitor, ConnectivityState};
pub use fetch::{FetchClient, FetchRequest, FetchResponse, HttpMethod};
pub use quota::{StorageEstimate, StorageQuota};
pub use worker::{BuildVersion, ControllerChangeStream, PageHost, WorkerRegistry};
