//! # Interception Worker
//!
//! An independent background worker that intercepts outbound page requests
//! and resolves them against the cache tiering store or the network, per a
//! fixed classification policy.
//!
//! ## Classification
//!
//! Every same-origin GET request is classified by an ordered route chain,
//! first match wins: background video, audio narration, user-downloaded
//! offline documents, then everything else. Non-GET and cross-origin
//! requests pass through untouched. Resolution never fails: every branch
//! ends in a served body or a typed placeholder.
//!
//! ## Lifecycle
//!
//! `install` opens every named tier, bulk-persists the static shell, and
//! best-effort preloads background videos; a shell failure fails the whole
//! install (a broken worker never becomes active). The worker then waits
//! until explicitly told to proceed. `activate` deletes tiers from prior
//! build epochs and claims open pages.
//!
//! The [`runtime`] module runs the worker on its own task (its own
//! cooperative event loop) and exposes the page-side
//! [`LocalWorkerRegistry`](runtime::LocalWorkerRegistry), communicating only
//! over message channels.

pub mod error;
pub mod request;
pub mod routes;
pub mod runtime;
pub mod worker;

pub use error::{Result, WorkerError};
pub use request::{PageRequest, PlaceholderKind, RequestDestination, Resolution, ServedFrom};
pub use routes::{classify, RouteKind, RoutePolicy};
pub use runtime::{LocalWorkerHost, LocalWorkerRegistry};
pub use worker::{InterceptionWorker, WorkerState};
