//! # Desktop Bridge Adapters
//!
//! Concrete desktop implementations of the `bridge-traits` seams:
//!
//! - [`ReqwestFetchClient`](fetch::ReqwestFetchClient) - HTTP fetch over reqwest/rustls
//! - [`ProbeConnectivityMonitor`](connectivity::ProbeConnectivityMonitor) - connectivity via HTTP probing
//! - [`FsStore`](store::FsStore) - filesystem-backed cache store (one directory per tier)
//! - [`FsQuota`](quota::FsQuota) - storage estimates from real file sizes and free disk space
//!
//! The worker registry and page host are not implemented here: desktop hosts
//! wire the in-process runtime from `core-worker`, embedded hosts bring
//! their own.

pub mod connectivity;
pub mod fetch;
pub mod quota;
pub mod store;

pub use connectivity::ProbeConnectivityMonitor;
pub use fetch::ReqwestFetchClient;
pub use quota::FsQuota;
pub use store::FsStore;
