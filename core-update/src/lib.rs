//! # Update Coordinator
//!
//! Detects a newer installed build waiting to take over and executes a
//! coordinated handoff without silently wedging the page.
//!
//! ## State Machine
//!
//! `NONE → AVAILABLE → APPLYING → {RELOADED | ERROR}`, monotonic per
//! detection cycle. Detection runs hourly and on demand; apply sends exactly
//! one acknowledged skip-waiting instruction, bounded by a short timeout,
//! and schedules the reload regardless of whether the acknowledgement
//! arrives. The authoritative success signal is the platform's
//! controller-change event, not the acknowledgement, which guarantees
//! forward progress even against a silent waiting worker.

pub mod coordinator;
pub mod error;
pub mod state;

pub use coordinator::{UpdateConfig, UpdateCoordinator};
pub use error::{Result, UpdateError};
pub use state::{UpdatePhase, UpdateState};
