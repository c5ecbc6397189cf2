//! Workspace umbrella crate.
//!
//! Host applications can depend on `reader-workspace` to pull in the offline
//! engine façade (`core-service`) without wiring each workspace crate
//! individually.

pub use core_service::{
    ContentUnitDescriptor, EngineConfig, EngineDependencies, OfflineEngine, OfflineStatus, UnitId,
};
