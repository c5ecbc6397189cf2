//! Engine configuration.
//!
//! One validated bag of settings covering the tier layout, the interception
//! routes, and the update handshake. Hosts construct it once at boot and
//! hand it to the service façade.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, RuntimeError};

/// Configuration for the offline engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The build version, used as the epoch tag qualifying tier names.
    pub build_version: String,

    /// The application origin; only same-origin GET requests are
    /// intercepted.
    pub origin: String,

    /// Static shell assets bulk-persisted at worker install.
    pub shell_manifest: Vec<String>,

    /// Background videos preloaded best-effort at install.
    pub video_manifest: Vec<String>,

    /// The shell document served for uncached navigations.
    pub shell_document: String,

    /// Path prefix of audio narration assets.
    pub audio_path_prefix: String,

    /// Path prefix of downloadable document content.
    pub offline_docs_prefix: String,

    /// Bounded retention for the pages tier.
    pub pages_max_entries: Option<usize>,
    pub pages_max_age: Option<Duration>,

    /// Bounded retention for the decorative video tier.
    pub video_max_entries: Option<usize>,

    /// Bounded retention for the audio tier.
    pub audio_max_entries: Option<usize>,

    /// How long the update coordinator waits for the skip-waiting
    /// acknowledgement before reloading anyway.
    pub update_ack_timeout: Duration,

    /// Interval between periodic update checks.
    pub update_check_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            build_version: "dev".to_string(),
            origin: "https://localhost".to_string(),
            shell_manifest: Vec::new(),
            video_manifest: Vec::new(),
            shell_document: "/index.html".to_string(),
            audio_path_prefix: "/audio/".to_string(),
            offline_docs_prefix: "/content/".to_string(),
            pages_max_entries: Some(128),
            pages_max_age: Some(Duration::from_secs(7 * 24 * 3600)),
            video_max_entries: Some(8),
            audio_max_entries: Some(32),
            update_ack_timeout: Duration::from_secs(3),
            update_check_interval: Duration::from_secs(3600),
        }
    }
}

impl EngineConfig {
    pub fn new(build_version: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            build_version: build_version.into(),
            origin: origin.into(),
            ..Self::default()
        }
    }

    pub fn with_shell_manifest(mut self, manifest: Vec<String>) -> Self {
        self.shell_manifest = manifest;
        self
    }

    pub fn with_video_manifest(mut self, manifest: Vec<String>) -> Self {
        self.video_manifest = manifest;
        self
    }

    /// Validate invariants the rest of the engine assumes.
    pub fn validate(&self) -> Result<()> {
        if self.build_version.is_empty() {
            return Err(RuntimeError::InvalidConfig(
                "build_version must not be empty".into(),
            ));
        }
        if !self.origin.starts_with("http://") && !self.origin.starts_with("https://") {
            return Err(RuntimeError::InvalidConfig(format!(
                "origin must be an absolute http(s) URL, got {:?}",
                self.origin
            )));
        }
        if !self.shell_document.starts_with('/') {
            return Err(RuntimeError::InvalidConfig(
                "shell_document must be an absolute path".into(),
            ));
        }
        for prefix in [&self.audio_path_prefix, &self.offline_docs_prefix] {
            if !prefix.starts_with('/') || !prefix.ends_with('/') {
                return Err(RuntimeError::InvalidConfig(format!(
                    "route prefixes must start and end with '/', got {prefix:?}"
                )));
            }
        }
        if self.update_ack_timeout.is_zero() {
            return Err(RuntimeError::InvalidConfig(
                "update_ack_timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_origin_and_prefixes() {
        let mut config = EngineConfig::new("v1", "reader.example.com");
        assert!(config.validate().is_err());

        config.origin = "https://reader.example.com".into();
        config.validate().unwrap();

        config.audio_path_prefix = "audio/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_ack_timeout() {
        let mut config = EngineConfig::default();
        config.update_ack_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = EngineConfig::new("2024.06.1", "https://reader.example.com")
            .with_shell_manifest(vec!["/index.html".into()]);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.build_version, "2024.06.1");
        assert_eq!(parsed.shell_manifest, vec!["/index.html".to_string()]);
    }
}
