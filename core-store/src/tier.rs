//! Tier naming, retention policies, and the per-build tier set.

use std::fmt;
use std::time::Duration;

/// The fixed tier kinds the engine partitions content into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierKind {
    /// Static application shell assets, bulk-persisted at install.
    Shell,
    /// Dynamic pages, filled network-first during browsing.
    Pages,
    /// Audio narration assets.
    Audio,
    /// Looping background videos (decorative).
    Video,
    /// User-downloaded offline documents; written only by the download
    /// orchestrator.
    OfflineDocs,
}

impl TierKind {
    pub const ALL: [TierKind; 5] = [
        TierKind::Shell,
        TierKind::Pages,
        TierKind::Audio,
        TierKind::Video,
        TierKind::OfflineDocs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::Shell => "shell",
            TierKind::Pages => "pages",
            TierKind::Audio => "audio",
            TierKind::Video => "video",
            TierKind::OfflineDocs => "offline",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded retention for a tier.
///
/// `max_entries` prunes oldest-first after writes; `max_age` makes expired
/// entries read as misses. `None` means unbounded in that dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_entries: Option<usize>,
    pub max_age: Option<Duration>,
}

impl RetentionPolicy {
    /// No bounds; the tier grows until the host quota intervenes.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }
}

/// A version-qualified tier name: `"<kind>-<epoch>"`.
///
/// The epoch tag is the build version that produced the tier. Tier names are
/// the garbage-collection basis: cleanup compares enumerated names against
/// the declared-current epoch's set and discards the rest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TierName(String);

impl TierName {
    pub fn new(kind: TierKind, epoch: &str) -> Self {
        Self(format!("{}-{}", kind.as_str(), epoch))
    }

    /// Parse a raw backend namespace back into a tier name.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tier kind, if the name carries a known prefix.
    pub fn kind(&self) -> Option<TierKind> {
        TierKind::ALL
            .iter()
            .copied()
            .find(|kind| self.0.starts_with(kind.as_str()) && self.0[kind.as_str().len()..].starts_with('-'))
    }

    /// The epoch tag, if the name carries a known prefix.
    pub fn epoch(&self) -> Option<&str> {
        self.kind().map(|kind| &self.0[kind.as_str().len() + 1..])
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tier's declaration: kind plus retention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSpec {
    pub kind: TierKind,
    pub retention: RetentionPolicy,
}

impl TierSpec {
    pub fn new(kind: TierKind, retention: RetentionPolicy) -> Self {
        Self { kind, retention }
    }

    pub fn unbounded(kind: TierKind) -> Self {
        Self::new(kind, RetentionPolicy::unbounded())
    }
}

/// The complete set of tiers for one build epoch.
#[derive(Debug, Clone)]
pub struct TierSet {
    epoch: String,
    specs: Vec<TierSpec>,
}

impl TierSet {
    /// Declare a tier set for `epoch`. Every kind missing from `specs` is
    /// added unbounded, so a set always covers all five kinds.
    pub fn new(epoch: impl Into<String>, specs: Vec<TierSpec>) -> Self {
        let mut specs = specs;
        for kind in TierKind::ALL {
            if !specs.iter().any(|spec| spec.kind == kind) {
                specs.push(TierSpec::unbounded(kind));
            }
        }
        Self {
            epoch: epoch.into(),
            specs,
        }
    }

    pub fn epoch(&self) -> &str {
        &self.epoch
    }

    pub fn specs(&self) -> &[TierSpec] {
        &self.specs
    }

    pub fn name_for(&self, kind: TierKind) -> TierName {
        TierName::new(kind, &self.epoch)
    }

    pub fn spec_for(&self, kind: TierKind) -> TierSpec {
        self.specs
            .iter()
            .copied()
            .find(|spec| spec.kind == kind)
            .unwrap_or(TierSpec::unbounded(kind))
    }

    pub fn names(&self) -> Vec<TierName> {
        self.specs
            .iter()
            .map(|spec| self.name_for(spec.kind))
            .collect()
    }

    pub fn contains(&self, name: &TierName) -> bool {
        self.names().iter().any(|current| current == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_name_round_trip() {
        let name = TierName::new(TierKind::Audio, "2024.06.1");
        assert_eq!(name.as_str(), "audio-2024.06.1");
        assert_eq!(name.kind(), Some(TierKind::Audio));
        assert_eq!(name.epoch(), Some("2024.06.1"));
    }

    #[test]
    fn test_tier_name_epoch_may_contain_dashes() {
        let name = TierName::new(TierKind::OfflineDocs, "v3-rc.1");
        assert_eq!(name.kind(), Some(TierKind::OfflineDocs));
        assert_eq!(name.epoch(), Some("v3-rc.1"));
    }

    #[test]
    fn test_foreign_name_has_no_kind() {
        let name = TierName::from_raw("thumbnails");
        assert_eq!(name.kind(), None);
        assert_eq!(name.epoch(), None);
    }

    #[test]
    fn test_tier_set_covers_all_kinds() {
        let set = TierSet::new(
            "v2",
            vec![TierSpec::new(
                TierKind::Video,
                RetentionPolicy::unbounded().with_max_entries(4),
            )],
        );

        assert_eq!(set.names().len(), TierKind::ALL.len());
        assert_eq!(set.spec_for(TierKind::Video).retention.max_entries, Some(4));
        assert_eq!(set.spec_for(TierKind::Shell).retention.max_entries, None);
    }

    #[test]
    fn test_tier_set_membership_is_epoch_sensitive() {
        let set = TierSet::new("v2", Vec::new());
        assert!(set.contains(&TierName::new(TierKind::Pages, "v2")));
        assert!(!set.contains(&TierName::new(TierKind::Pages, "v1")));
    }
}
