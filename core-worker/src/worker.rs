//! Worker lifecycle and request resolution.

use bytes::Bytes;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use bridge_traits::fetch::{FetchClient, FetchRequest};
use bridge_traits::worker::{BuildVersion, PageHost};
use core_offline::{audio_key, text_key};
use core_store::{drop_stale_tiers, CacheStore, Tier, TierKind, TierSet};

use crate::error::{Result, WorkerError};
use crate::request::{PageRequest, PlaceholderKind, Resolution, ServedFrom};
use crate::routes::{classify, unit_id_for_path, RouteKind, RoutePolicy};

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    New,
    Installing,
    /// Installed and waiting to be told to proceed.
    Installed,
    Activating,
    Active,
    /// Install failed; this worker never serves requests.
    Failed,
}

impl WorkerState {
    fn name(&self) -> &'static str {
        match self {
            WorkerState::New => "new",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Failed => "failed",
        }
    }
}

/// The interception worker for one build version.
pub struct InterceptionWorker {
    version: BuildVersion,
    tiers: TierSet,
    store: Arc<dyn CacheStore>,
    fetch: Arc<dyn FetchClient>,
    pages: Arc<dyn PageHost>,
    policy: RoutePolicy,
    origin: Url,
    shell_manifest: Vec<String>,
    video_manifest: Vec<String>,
    state: RwLock<WorkerState>,
}

impl InterceptionWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: BuildVersion,
        tiers: TierSet,
        store: Arc<dyn CacheStore>,
        fetch: Arc<dyn FetchClient>,
        pages: Arc<dyn PageHost>,
        policy: RoutePolicy,
        origin: Url,
        shell_manifest: Vec<String>,
        video_manifest: Vec<String>,
    ) -> Self {
        Self {
            version,
            tiers,
            store,
            fetch,
            pages,
            policy,
            origin,
            shell_manifest,
            video_manifest,
            state: RwLock::new(WorkerState::New),
        }
    }

    pub fn version(&self) -> &BuildVersion {
        &self.version
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read()
    }

    fn tier(&self, kind: TierKind) -> Tier {
        Tier::new(
            Arc::clone(&self.store),
            self.tiers.name_for(kind),
            self.tiers.spec_for(kind).retention,
        )
    }

    fn transition(&self, from: WorkerState, to: WorkerState) -> Result<()> {
        let mut state = self.state.write();
        if *state != from {
            return Err(WorkerError::InvalidState {
                expected: from.name(),
                actual: state.name(),
            });
        }
        *state = to;
        Ok(())
    }

    /// Install: bulk-persist the static shell, then best-effort preload
    /// background videos.
    ///
    /// Tiers are namespaces of the blob store and materialize on first
    /// write, so "opening" them needs no explicit call. A shell failure
    /// fails the whole install; a video preload failure is logged only.
    #[instrument(skip(self), fields(version = %self.version))]
    pub async fn install(&self) -> Result<()> {
        self.transition(WorkerState::New, WorkerState::Installing)?;
        info!(shell_assets = self.shell_manifest.len(), "installing worker");

        let shell = self.tier(TierKind::Shell);
        for path in &self.shell_manifest {
            match self.fetch_path(path).await {
                Some(body) => {
                    if let Err(error) = shell.put(path, body).await {
                        *self.state.write() = WorkerState::Failed;
                        return Err(WorkerError::InstallFailed(format!(
                            "persisting shell asset {path}: {error}"
                        )));
                    }
                }
                None => {
                    *self.state.write() = WorkerState::Failed;
                    return Err(WorkerError::InstallFailed(format!(
                        "fetching shell asset {path}"
                    )));
                }
            }
        }

        let video = self.tier(TierKind::Video);
        for path in &self.video_manifest {
            match self.fetch_path(path).await {
                Some(body) => {
                    if let Err(error) = video.put(path, body).await {
                        warn!(path, %error, "video preload persist failed; continuing install");
                    }
                }
                None => warn!(path, "video preload fetch failed; continuing install"),
            }
        }

        self.transition(WorkerState::Installing, WorkerState::Installed)?;
        info!("worker installed");
        Ok(())
    }

    /// Activate: garbage-collect tiers from prior build epochs, then claim
    /// open pages.
    ///
    /// One failed tier deletion does not abort cleanup of the others; after
    /// activation no tier name from a prior epoch remains reachable.
    #[instrument(skip(self), fields(version = %self.version))]
    pub async fn activate(&self) -> Result<()> {
        self.transition(WorkerState::Installed, WorkerState::Activating)?;

        let dropped = drop_stale_tiers(&self.store, &self.tiers)
            .await
            .map_err(|error| WorkerError::ActivateFailed(error.to_string()))?;
        if !dropped.is_empty() {
            info!(count = dropped.len(), "dropped stale-epoch tiers");
        }

        if let Err(error) = self.pages.claim().await {
            warn!(%error, "page claim failed; pages adopt the worker on next load");
        }

        self.transition(WorkerState::Activating, WorkerState::Active)?;
        info!("worker active");
        Ok(())
    }

    /// Resolve one intercepted request. Never returns an error: every branch
    /// ends in a served body or a typed placeholder.
    #[instrument(skip(self), fields(path = request.path()))]
    pub async fn resolve(&self, request: &PageRequest) -> Resolution {
        if !request.method.is_get() || !request.is_same_origin(&self.origin) {
            return Resolution::PassThrough;
        }

        match classify(request, &self.policy) {
            RouteKind::BackgroundVideo => self.resolve_video(request).await,
            RouteKind::AudioNarration => self.resolve_audio(request).await,
            RouteKind::OfflineDocs => self.resolve_offline_doc(request).await,
            RouteKind::Dynamic => self.resolve_dynamic(request).await,
        }
    }

    /// Video: cache-first against the video tier; network fills the cache; a
    /// total miss is a typed placeholder because the asset is decorative.
    async fn resolve_video(&self, request: &PageRequest) -> Resolution {
        let tier = self.tier(TierKind::Video);
        if let Some(body) = self.cache_lookup(&tier, request.path()).await {
            return Resolution::served(body, ServedFrom::Tier(TierKind::Video));
        }

        if let Some(body) = self.fetch_path(request.path()).await {
            self.cache_fill(&tier, request.path(), body.clone()).await;
            return Resolution::served(body, ServedFrom::Network);
        }

        debug!("background video unavailable");
        Resolution::Placeholder(PlaceholderKind::Unavailable)
    }

    /// Audio narration: checked across the audio tier, the downloaded
    /// offline unit, then the network.
    async fn resolve_audio(&self, request: &PageRequest) -> Resolution {
        let tier = self.tier(TierKind::Audio);
        if let Some(body) = self.cache_lookup(&tier, request.path()).await {
            return Resolution::served(body, ServedFrom::Tier(TierKind::Audio));
        }

        if let Some(id) = unit_id_for_path(request.path(), &self.policy.audio_path_prefix) {
            let offline = self.tier(TierKind::OfflineDocs);
            if let Some(body) = self.cache_lookup(&offline, &audio_key(&id)).await {
                return Resolution::served(body, ServedFrom::Tier(TierKind::OfflineDocs));
            }
        }

        if let Some(body) = self.fetch_path(request.path()).await {
            self.cache_fill(&tier, request.path(), body.clone()).await;
            return Resolution::served(body, ServedFrom::Network);
        }

        Resolution::Placeholder(PlaceholderKind::NotAvailableOffline)
    }

    /// Offline documents: cache-first with network fallback. The network
    /// result is not written back; the download orchestrator is the offline
    /// tier's only writer.
    async fn resolve_offline_doc(&self, request: &PageRequest) -> Resolution {
        if let Some(id) = unit_id_for_path(request.path(), &self.policy.offline_docs_prefix) {
            let offline = self.tier(TierKind::OfflineDocs);
            if let Some(body) = self.cache_lookup(&offline, &text_key(&id)).await {
                return Resolution::served(body, ServedFrom::Tier(TierKind::OfflineDocs));
            }
        }

        if let Some(body) = self.fetch_path(request.path()).await {
            return Resolution::served(body, ServedFrom::Network);
        }

        Resolution::Placeholder(PlaceholderKind::NotAvailableOffline)
    }

    /// Everything else: network-first into the pages tier; on network
    /// failure fall back to the pages tier, then the shell tier, then (for
    /// navigations) the cached shell document so the app still boots
    /// offline.
    async fn resolve_dynamic(&self, request: &PageRequest) -> Resolution {
        let pages = self.tier(TierKind::Pages);

        if let Some(body) = self.fetch_path(request.path()).await {
            self.cache_fill(&pages, request.path(), body.clone()).await;
            return Resolution::served(body, ServedFrom::Network);
        }

        if let Some(body) = self.cache_lookup(&pages, request.path()).await {
            return Resolution::served(body, ServedFrom::Tier(TierKind::Pages));
        }

        let shell = self.tier(TierKind::Shell);
        if let Some(body) = self.cache_lookup(&shell, request.path()).await {
            return Resolution::served(body, ServedFrom::Tier(TierKind::Shell));
        }

        if request.is_navigation() {
            if let Some(body) = self.cache_lookup(&shell, &self.policy.shell_document).await {
                debug!("serving shell fallback for uncached navigation");
                return Resolution::served(body, ServedFrom::ShellFallback);
            }
        }

        Resolution::Placeholder(PlaceholderKind::Unavailable)
    }

    /// Fetch a same-origin path. Any transport error or non-success status
    /// reads as `None`; the caller decides the fallback.
    async fn fetch_path(&self, path: &str) -> Option<Bytes> {
        let url = match self.origin.join(path) {
            Ok(url) => url,
            Err(error) => {
                warn!(path, %error, "unresolvable request path");
                return None;
            }
        };

        match self.fetch.execute(FetchRequest::get(url.as_str())).await {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                debug!(path, status = response.status, "network answered non-success");
                None
            }
            Err(error) => {
                debug!(path, %error, "network fetch failed");
                None
            }
        }
    }

    /// A store read failure reads as a miss; resolution never surfaces it.
    async fn cache_lookup(&self, tier: &Tier, key: &str) -> Option<Bytes> {
        match tier.get(key).await {
            Ok(hit) => hit,
            Err(error) => {
                warn!(tier = %tier.name(), key, %error, "cache read failed; treating as miss");
                None
            }
        }
    }

    /// Cache fills are best-effort; a failed write never fails the response.
    async fn cache_fill(&self, tier: &Tier, key: &str, body: Bytes) {
        if let Err(error) = tier.put(key, body).await {
            warn!(tier = %tier.name(), key, %error, "cache fill failed");
        }
    }
}
