//! Content unit identifiers, descriptors, and the persisted index record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one downloadable content unit (chapter, meditation, story).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What the caller supplies when a user requests a download: identity plus
/// the fetch locations of the payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentUnitDescriptor {
    pub id: UnitId,
    pub title: String,
    pub text_url: String,
    pub audio_url: Option<String>,
}

impl ContentUnitDescriptor {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        text_url: impl Into<String>,
    ) -> Self {
        Self {
            id: UnitId::new(id),
            title: title.into(),
            text_url: text_url.into(),
            audio_url: None,
        }
    }

    pub fn with_audio(mut self, audio_url: impl Into<String>) -> Self {
        self.audio_url = Some(audio_url.into());
        self
    }
}

/// The persisted index record for a downloaded unit.
///
/// Serialized as JSON into the offline tier alongside the payloads; the
/// in-memory index is rebuilt from these records at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub id: UnitId,
    pub title: String,
    /// Combined payload size (text plus audio), in bytes.
    pub size_bytes: u64,
    pub has_audio: bool,
    pub downloaded_at: DateTime<Utc>,
    /// SHA-256 digest of the text payload, verified on read.
    pub text_digest: String,
    /// SHA-256 digest of the audio payload, when present.
    pub audio_digest: Option<String>,
}

/// Offline-tier key for a unit's text payload.
pub fn text_key(id: &UnitId) -> String {
    format!("{}/text", id)
}

/// Offline-tier key for a unit's audio narration payload.
pub fn audio_key(id: &UnitId) -> String {
    format!("{}/audio", id)
}

/// Offline-tier key for a unit's serialized metadata record.
pub fn meta_key(id: &UnitId) -> String {
    format!("{}/meta", id)
}

/// Recover the unit id from a metadata key, for index rebuilds.
pub fn unit_id_from_meta_key(key: &str) -> Option<UnitId> {
    key.strip_suffix("/meta").map(UnitId::new)
}
