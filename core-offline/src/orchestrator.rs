//! # Download Orchestrator
//!
//! Fetches and persists discrete content units into the offline tier, tracks
//! per-unit progress through the shared status object, and maintains the
//! authoritative local index.
//!
//! The orchestrator is the offline tier's only writer, which is what keeps
//! the in-memory index consistent without cross-process locking: readers on
//! the worker side see the tier through the store, readers on the page side
//! see the index.

use bytes::Bytes;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, instrument, warn};

use bridge_traits::fetch::{FetchClient, FetchRequest};
use bridge_traits::quota::StorageQuota;
use core_store::Tier;

use crate::error::{OfflineError, Result};
use crate::status::StatusBroadcast;
use crate::unit::{
    audio_key, meta_key, text_key, unit_id_from_meta_key, ContentUnit, ContentUnitDescriptor,
    UnitId,
};

/// Coarse progress milestones reported while a unit downloads.
const PROGRESS_STARTED: u8 = 5;
const PROGRESS_TEXT_FETCHED: u8 = 45;
const PROGRESS_AUDIO_FETCHED: u8 = 85;
const PROGRESS_PERSISTED: u8 = 95;

type DownloadOutcome = std::result::Result<(), OfflineError>;

/// Orchestrates offline content downloads.
pub struct DownloadOrchestrator {
    fetch: Arc<dyn FetchClient>,
    quota: Arc<dyn StorageQuota>,
    offline_tier: Tier,
    status: Arc<StatusBroadcast>,
    index: RwLock<HashMap<UnitId, ContentUnit>>,
    in_flight: Mutex<HashMap<UnitId, broadcast::Sender<DownloadOutcome>>>,
}

impl DownloadOrchestrator {
    pub fn new(
        fetch: Arc<dyn FetchClient>,
        quota: Arc<dyn StorageQuota>,
        offline_tier: Tier,
        status: Arc<StatusBroadcast>,
    ) -> Self {
        Self {
            fetch,
            quota,
            offline_tier,
            status,
            index: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Rebuild the in-memory index from persisted unit metadata and publish
    /// the recovered downloaded-units list and storage counters.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let keys = self.offline_tier.keys().await?;
        let mut recovered = HashMap::new();

        for key in keys {
            let Some(id) = unit_id_from_meta_key(&key) else {
                continue;
            };
            let Some(raw) = self.offline_tier.get(&key).await? else {
                continue;
            };
            match serde_json::from_slice::<ContentUnit>(&raw) {
                Ok(unit) => {
                    recovered.insert(id, unit);
                }
                Err(error) => {
                    warn!(%id, %error, "discarding unreadable unit metadata");
                    self.remove_unit_entries(&id).await;
                }
            }
        }

        info!(units = recovered.len(), "offline index rebuilt");
        *self.index.write() = recovered;
        self.publish_downloaded_list();
        self.refresh_storage().await;
        Ok(())
    }

    /// Download a unit into the offline tier.
    ///
    /// Reports coarse progress milestones through the shared status object.
    /// Any fetch or persist failure discards partial data, leaves the unit
    /// absent, clears its progress entry, and surfaces a typed error; there
    /// is no automatic retry.
    ///
    /// A call for a unit already mid-download attaches to the in-flight
    /// operation: exactly one fetch happens and every caller observes the
    /// same completion.
    #[instrument(skip(self, descriptor), fields(id = %descriptor.id))]
    pub async fn download_chapter(&self, descriptor: ContentUnitDescriptor) -> Result<()> {
        if self.is_chapter_offline(&descriptor.id) {
            debug!(id = %descriptor.id, "unit already offline");
            return Ok(());
        }

        let id = descriptor.id.clone();
        let mut joined = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&id) {
                Some(sender) => Some(sender.subscribe()),
                None => {
                    let (sender, _) = broadcast::channel(1);
                    in_flight.insert(id.clone(), sender);
                    None
                }
            }
        };

        if let Some(receiver) = joined.as_mut() {
            debug!(%id, "attaching to in-flight download");
            return match receiver.recv().await {
                Ok(outcome) => outcome,
                Err(_) => Err(OfflineError::Internal(format!(
                    "in-flight download for {id} vanished"
                ))),
            };
        }

        let outcome = self.run_download(&descriptor).await;

        // Completion order matters: the entry is removed under the lock
        // before the outcome is sent, so late callers either join before the
        // send or find the unit present in the index.
        let mut in_flight = self.in_flight.lock().await;
        if let Some(sender) = in_flight.remove(&id) {
            let _ = sender.send(outcome.clone());
        }
        drop(in_flight);

        outcome
    }

    async fn run_download(&self, descriptor: &ContentUnitDescriptor) -> DownloadOutcome {
        let id = &descriptor.id;
        info!(%id, title = %descriptor.title, "starting download");
        self.status.set_progress(id, PROGRESS_STARTED);

        let result = self.fetch_and_persist(descriptor).await;

        match result {
            Ok(unit) => {
                self.index.write().insert(id.clone(), unit);
                self.status.clear_progress(id);
                self.publish_downloaded_list();
                self.refresh_storage().await;
                info!(%id, "download complete");
                Ok(())
            }
            Err(error) => {
                warn!(%id, %error, "download failed; unit left absent");
                self.status.clear_progress(id);
                Err(error)
            }
        }
    }

    async fn fetch_and_persist(&self, descriptor: &ContentUnitDescriptor) -> Result<ContentUnit> {
        let id = &descriptor.id;

        let text = self.fetch_payload(&descriptor.text_url).await?;
        self.status.set_progress(id, PROGRESS_TEXT_FETCHED);

        let audio = match &descriptor.audio_url {
            Some(url) => Some(self.fetch_payload(url).await?),
            None => None,
        };
        self.status.set_progress(id, PROGRESS_AUDIO_FETCHED);

        let unit = ContentUnit {
            id: id.clone(),
            title: descriptor.title.clone(),
            size_bytes: text.len() as u64 + audio.as_ref().map(|a| a.len() as u64).unwrap_or(0),
            has_audio: audio.is_some(),
            downloaded_at: chrono::Utc::now(),
            text_digest: digest(&text),
            audio_digest: audio.as_ref().map(|a| digest(a)),
        };

        self.persist_unit(&unit, text, audio).await?;
        self.status.set_progress(id, PROGRESS_PERSISTED);
        Ok(unit)
    }

    async fn fetch_payload(&self, url: &str) -> Result<Bytes> {
        let response = self.fetch.execute(FetchRequest::get(url)).await?;
        if !response.is_success() {
            return Err(OfflineError::FetchFailed {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response.body)
    }

    /// Persist text, audio, and metadata as one unit. On any write failure
    /// the entries written so far are deleted so the unit stays fully
    /// absent.
    async fn persist_unit(
        &self,
        unit: &ContentUnit,
        text: Bytes,
        audio: Option<Bytes>,
    ) -> Result<()> {
        let id = &unit.id;

        if let Err(error) = self.offline_tier.put(&text_key(id), text).await {
            return Err(map_persist_error(error.into()));
        }

        if let Some(audio) = audio {
            if let Err(error) = self.offline_tier.put(&audio_key(id), audio).await {
                self.remove_unit_entries(id).await;
                return Err(map_persist_error(error.into()));
            }
        }

        let meta = serde_json::to_vec(unit)
            .map_err(|error| OfflineError::Internal(error.to_string()))?;
        if let Err(error) = self.offline_tier.put(&meta_key(id), Bytes::from(meta)).await {
            self.remove_unit_entries(id).await;
            return Err(map_persist_error(error.into()));
        }

        Ok(())
    }

    /// Remove the unit from the offline tier. Idempotent; recomputes
    /// aggregate storage afterward.
    #[instrument(skip(self))]
    pub async fn remove_offline_chapter(&self, id: &UnitId) -> Result<()> {
        self.remove_unit_entries(id).await;
        let removed = self.index.write().remove(id).is_some();
        if removed {
            info!(%id, "removed offline unit");
        }
        self.publish_downloaded_list();
        self.refresh_storage().await;
        Ok(())
    }

    /// Empty the offline tier and reset the downloaded-units list and
    /// storage counters. Other tiers are untouched.
    #[instrument(skip(self))]
    pub async fn clear_all_offline_content(&self) -> Result<()> {
        self.offline_tier.clear().await?;
        self.index.write().clear();
        info!("cleared all offline content");
        self.publish_downloaded_list();
        self.refresh_storage().await;
        Ok(())
    }

    /// Synchronous presence check against the in-memory index.
    pub fn is_chapter_offline(&self, id: &UnitId) -> bool {
        self.index.read().contains_key(id)
    }

    /// Synchronous index lookup.
    pub fn get_offline_chapter(&self, id: &UnitId) -> Option<ContentUnit> {
        self.index.read().get(id).cloned()
    }

    /// Every downloaded unit, most recent last.
    pub fn downloaded_chapters(&self) -> Vec<ContentUnit> {
        let mut units: Vec<ContentUnit> = self.index.read().values().cloned().collect();
        units.sort_by(|a, b| {
            a.downloaded_at
                .cmp(&b.downloaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        units
    }

    /// Retrieve a unit's text payload. Absence resolves to `Ok(None)`.
    pub async fn get_offline_content(&self, id: &UnitId) -> Result<Option<Bytes>> {
        let Some(unit) = self.get_offline_chapter(id) else {
            return Ok(None);
        };
        self.read_verified(id, &text_key(id), &unit.text_digest).await
    }

    /// Retrieve a unit's audio narration. Absence (including a unit with no
    /// audio) resolves to `Ok(None)`.
    pub async fn get_offline_audio(&self, id: &UnitId) -> Result<Option<Bytes>> {
        let Some(unit) = self.get_offline_chapter(id) else {
            return Ok(None);
        };
        let Some(expected_digest) = unit.audio_digest else {
            return Ok(None);
        };
        self.read_verified(id, &audio_key(id), &expected_digest).await
    }

    /// Read a payload and verify its recorded digest. A mismatch means the
    /// stored unit is corrupt: the whole unit is evicted and the read
    /// resolves to `Ok(None)`.
    async fn read_verified(
        &self,
        id: &UnitId,
        key: &str,
        expected_digest: &str,
    ) -> Result<Option<Bytes>> {
        let Some(data) = self.offline_tier.get(key).await? else {
            return Ok(None);
        };

        if digest(&data) != expected_digest {
            warn!(%id, key, "digest mismatch; evicting corrupt unit");
            self.remove_offline_chapter(id).await?;
            return Ok(None);
        }

        Ok(Some(data))
    }

    /// Delete a unit's tier entries, ignoring individual failures so removal
    /// stays idempotent.
    async fn remove_unit_entries(&self, id: &UnitId) {
        for key in [text_key(id), audio_key(id), meta_key(id)] {
            if let Err(error) = self.offline_tier.delete(&key).await {
                warn!(%id, key, %error, "failed to delete unit entry");
            }
        }
    }

    fn publish_downloaded_list(&self) {
        let ids = self
            .downloaded_chapters()
            .into_iter()
            .map(|unit| unit.id)
            .collect();
        self.status.set_downloaded_chapters(ids);
    }

    /// Recompute storage from actual tier contents plus the host quota.
    /// Never accumulated incrementally.
    async fn refresh_storage(&self) {
        let used = match self.offline_tier.total_size().await {
            Ok(used) => used,
            Err(error) => {
                warn!(%error, "failed to recompute offline tier size");
                return;
            }
        };
        let available = match self.quota.estimate().await {
            Ok(estimate) => estimate.available_bytes,
            Err(error) => {
                debug!(%error, "storage quota unavailable; keeping previous value");
                self.status.snapshot().storage_available
            }
        };
        self.status.set_storage(used, available);
    }
}

fn digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn map_persist_error(error: OfflineError) -> OfflineError {
    match error {
        quota @ OfflineError::QuotaExceeded { .. } => quota,
        other => OfflineError::PartialDownloadAborted(other.to_string()),
    }
}
