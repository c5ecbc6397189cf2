//! # Offline Content Downloads
//!
//! The download orchestrator persists user-selected content units
//! (chapters, meditations, stories) into the offline tier, tracks per-unit
//! progress, and maintains the authoritative local index; the status
//! broadcast fans connectivity/storage/progress state out to any number of
//! observers.
//!
//! ## Atomicity
//!
//! A content unit is text plus optional audio narration persisted as one
//! unit: it is fully present or fully absent, never partial. Any fetch or
//! persist failure rolls back already-written entries, clears the unit's
//! progress, and surfaces a typed error. Retry policy belongs to the caller.
//!
//! ## Concurrency
//!
//! Independent units download independently. A second `download_chapter`
//! call for a unit already mid-download attaches to the in-flight operation
//! instead of starting a duplicate fetch, so N concurrent callers produce
//! exactly one network fetch and observe the same completion.

pub mod error;
pub mod orchestrator;
pub mod status;
pub mod unit;

pub use error::{OfflineError, Result};
pub use orchestrator::DownloadOrchestrator;
pub use status::{OfflineStatus, StatusBroadcast, Subscription};
pub use unit::{audio_key, meta_key, text_key, ContentUnit, ContentUnitDescriptor, UnitId};
