//! # Cache Tiering Store
//!
//! Named, independently-retained partitions ("tiers") of a persistent
//! key/blob store: shell assets, dynamic pages, audio narration, background
//! video, and user-downloaded offline documents.
//!
//! ## Overview
//!
//! - [`CacheStore`] is the pluggable backend: any store that can retrieve by
//!   key, enumerate keys, delete by key, and report total size qualifies. No
//!   on-disk format is mandated.
//! - [`Tier`] wraps a backend with a version-qualified [`TierName`] and a
//!   [`RetentionPolicy`], enforcing `max_entries` (oldest-first prune) and
//!   `max_age` (expired entries read as misses).
//! - Tier names embed the build version as an epoch tag
//!   (`"audio-2024.06.1"`). Activating a new build's [`TierSet`] makes the
//!   previous epoch's tiers unreachable; [`drop_stale_tiers`] garbage-collects
//!   them by comparing enumerated names against the declared-current set.
//! - [`MemoryStore`](memory::MemoryStore) is the in-memory backend used by
//!   tests and ephemeral sessions; persistent backends live behind the same
//!   trait in the platform bridge crates.
//!
//! ## Writer Discipline
//!
//! The store is shared between the page process and the worker process, but
//! each tier has exactly one writer: the interception worker writes
//! shell/pages/audio/video, the download orchestrator writes the offline
//! tier. That discipline is what keeps the orchestrator's in-memory index
//! valid without cross-process locking; this crate does not enforce it.

pub mod error;
pub mod memory;
pub mod store;
pub mod tier;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use store::{drop_stale_tiers, CacheStore, EntryMeta, StoredEntry, Tier};
pub use tier::{RetentionPolicy, TierKind, TierName, TierSet, TierSpec};
