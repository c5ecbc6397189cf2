//! Offline engine façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (fetch,
//! connectivity, storage quota, worker registry, page host) plus a cache
//! store backend into the offline engine, and exposes the published
//! page-side interface: the status subscription, the download surface, and
//! the update surface. The interception worker runs on its own event loop;
//! [`OfflineEngine::build_worker`] constructs one bound to the same
//! configuration and store.

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;
use url::Url;

use bridge_traits::{
    connectivity::{ConnectivityChangeStream, ConnectivityMonitor},
    fetch::FetchClient,
    quota::StorageQuota,
    worker::{PageHost, WorkerRegistry},
};
use core_offline::{DownloadOrchestrator, StatusBroadcast};
use core_store::{CacheStore, RetentionPolicy, Tier, TierKind, TierSet, TierSpec};
use core_update::{UpdateConfig, UpdateCoordinator};
use core_worker::{InterceptionWorker, RoutePolicy};

pub use bridge_traits::worker::BuildVersion;
pub use bytes::Bytes;
pub use core_offline::{
    ContentUnit, ContentUnitDescriptor, OfflineStatus, Subscription, UnitId,
};
pub use core_runtime::EngineConfig;
pub use core_update::UpdateState;

/// Aggregated handle to all bridge dependencies the engine requires.
#[derive(Clone)]
pub struct EngineDependencies {
    pub fetch: Arc<dyn FetchClient>,
    pub store: Arc<dyn CacheStore>,
    pub connectivity: Arc<dyn ConnectivityMonitor>,
    pub quota: Arc<dyn StorageQuota>,
    pub registry: Arc<dyn WorkerRegistry>,
    pub page: Arc<dyn PageHost>,
}

impl EngineDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        fetch: Arc<dyn FetchClient>,
        store: Arc<dyn CacheStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        quota: Arc<dyn StorageQuota>,
        registry: Arc<dyn WorkerRegistry>,
        page: Arc<dyn PageHost>,
    ) -> Self {
        Self {
            fetch,
            store,
            connectivity,
            quota,
            registry,
            page,
        }
    }
}

struct EngineInner {
    status: Arc<StatusBroadcast>,
    orchestrator: DownloadOrchestrator,
    updates: Arc<UpdateCoordinator>,
    background_tasks: Vec<JoinHandle<()>>,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        for task in &self.background_tasks {
            task.abort();
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct OfflineEngine {
    inner: Arc<EngineInner>,
}

impl OfflineEngine {
    /// Boot the page-side engine: rebuild the offline index, mirror
    /// connectivity into the status object, and start the periodic update
    /// check.
    pub async fn new(config: EngineConfig, deps: EngineDependencies) -> Result<Self> {
        config.validate()?;

        let tiers = tier_set(&config);
        let status = StatusBroadcast::new();

        let offline_tier = Tier::new(
            Arc::clone(&deps.store),
            tiers.name_for(TierKind::OfflineDocs),
            tiers.spec_for(TierKind::OfflineDocs).retention,
        );
        let orchestrator = DownloadOrchestrator::new(
            Arc::clone(&deps.fetch),
            Arc::clone(&deps.quota),
            offline_tier,
            Arc::clone(&status),
        );
        orchestrator.initialize().await?;

        let updates = UpdateCoordinator::new(
            Arc::clone(&deps.registry),
            Arc::clone(&deps.page),
            UpdateConfig {
                ack_timeout: config.update_ack_timeout,
                check_interval: config.update_check_interval,
            },
        );

        let mut background_tasks = Vec::new();

        status.set_online(deps.connectivity.is_online().await);
        match deps.connectivity.subscribe_changes().await {
            Ok(mut changes) => {
                let status = Arc::clone(&status);
                background_tasks.push(tokio::spawn(async move {
                    while let Some(state) = changes.next().await {
                        status.set_online(state.is_online());
                    }
                }));
            }
            Err(error) => {
                warn!(%error, "connectivity change stream unavailable; status stays static");
            }
        }

        background_tasks.push(updates.spawn_periodic_checks());

        Ok(Self {
            inner: Arc::new(EngineInner {
                status,
                orchestrator,
                updates,
                background_tasks,
            }),
        })
    }

    /// Construct an interception worker bound to the same configuration and
    /// store, ready to be spawned on the worker-side event loop.
    pub fn build_worker(
        config: &EngineConfig,
        deps: &EngineDependencies,
    ) -> Result<InterceptionWorker> {
        config.validate()?;
        let origin = Url::parse(&config.origin)
            .map_err(|error| CoreError::InitializationFailed(format!("origin: {error}")))?;

        Ok(InterceptionWorker::new(
            BuildVersion::new(&config.build_version),
            tier_set(config),
            Arc::clone(&deps.store),
            Arc::clone(&deps.fetch),
            Arc::clone(&deps.page),
            RoutePolicy {
                audio_path_prefix: config.audio_path_prefix.clone(),
                offline_docs_prefix: config.offline_docs_prefix.clone(),
                shell_document: config.shell_document.clone(),
            },
            origin,
            config.shell_manifest.clone(),
            config.video_manifest.clone(),
        ))
    }

    // ------------------------------------------------------------------
    // Status surface
    // ------------------------------------------------------------------

    /// Subscribe to offline status snapshots. The callback fires
    /// synchronously with the current snapshot and on every mutation.
    pub fn subscribe(
        &self,
        callback: impl Fn(&OfflineStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.status.subscribe(callback)
    }

    /// Current status snapshot.
    pub fn status(&self) -> OfflineStatus {
        self.inner.status.snapshot()
    }

    // ------------------------------------------------------------------
    // Download surface
    // ------------------------------------------------------------------

    pub async fn download_chapter(&self, descriptor: ContentUnitDescriptor) -> Result<()> {
        Ok(self.inner.orchestrator.download_chapter(descriptor).await?)
    }

    pub async fn remove_offline_chapter(&self, id: &UnitId) -> Result<()> {
        Ok(self.inner.orchestrator.remove_offline_chapter(id).await?)
    }

    pub async fn clear_all_offline_content(&self) -> Result<()> {
        Ok(self.inner.orchestrator.clear_all_offline_content().await?)
    }

    pub fn is_chapter_offline(&self, id: &UnitId) -> bool {
        self.inner.orchestrator.is_chapter_offline(id)
    }

    pub fn get_offline_chapter(&self, id: &UnitId) -> Option<ContentUnit> {
        self.inner.orchestrator.get_offline_chapter(id)
    }

    pub async fn get_offline_content(&self, id: &UnitId) -> Result<Option<Bytes>> {
        Ok(self.inner.orchestrator.get_offline_content(id).await?)
    }

    pub async fn get_offline_audio(&self, id: &UnitId) -> Result<Option<Bytes>> {
        Ok(self.inner.orchestrator.get_offline_audio(id).await?)
    }

    // ------------------------------------------------------------------
    // Update surface
    // ------------------------------------------------------------------

    pub fn is_update_available(&self) -> bool {
        self.inner.updates.is_update_available()
    }

    pub fn is_update_applying(&self) -> bool {
        self.inner.updates.is_update_applying()
    }

    pub fn update_error(&self) -> Option<String> {
        self.inner.updates.update_error()
    }

    pub fn update_state(&self) -> UpdateState {
        self.inner.updates.state()
    }

    pub async fn check_for_updates(&self) -> Result<bool> {
        Ok(self.inner.updates.check_for_updates().await?)
    }

    pub async fn apply_update(&self) -> Result<()> {
        Ok(self.inner.updates.apply_update().await?)
    }
}

fn tier_set(config: &EngineConfig) -> TierSet {
    TierSet::new(
        &config.build_version,
        vec![
            TierSpec::new(
                TierKind::Pages,
                RetentionPolicy {
                    max_entries: config.pages_max_entries,
                    max_age: config.pages_max_age,
                },
            ),
            TierSpec::new(
                TierKind::Video,
                RetentionPolicy {
                    max_entries: config.video_max_entries,
                    max_age: None,
                },
            ),
            TierSpec::new(
                TierKind::Audio,
                RetentionPolicy {
                    max_entries: config.audio_max_entries,
                    max_age: None,
                },
            ),
        ],
    )
}
