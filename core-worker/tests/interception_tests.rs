//! Integration tests for request interception and the worker lifecycle.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::fetch::{FetchClient, FetchRequest, FetchResponse, HttpMethod};
use bridge_traits::worker::{BuildVersion, PageHost, WorkerRegistry};
use core_offline::{audio_key, text_key, UnitId};
use core_store::{CacheStore, MemoryStore, TierKind, TierName, TierSet};
use core_worker::{
    InterceptionWorker, LocalWorkerHost, PageRequest, PlaceholderKind, RequestDestination,
    Resolution, RoutePolicy, ServedFrom, WorkerState,
};

struct FakeFetch {
    routes: HashMap<String, Bytes>,
    offline: AtomicBool,
    fetches: AtomicUsize,
}

impl FakeFetch {
    fn new() -> Self {
        Self {
            routes: HashMap::new(),
            offline: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    fn route(mut self, url: &str, body: &'static [u8]) -> Self {
        self.routes.insert(url.to_string(), Bytes::from_static(body));
        self
    }

    fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchClient for FakeFetch {
    async fn execute(&self, request: FetchRequest) -> BridgeResult<FetchResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(BridgeError::NetworkUnavailable("no route to host".into()));
        }
        Ok(match self.routes.get(&request.url) {
            Some(body) => FetchResponse {
                status: 200,
                headers: HashMap::new(),
                body: body.clone(),
            },
            None => FetchResponse {
                status: 404,
                headers: HashMap::new(),
                body: Bytes::new(),
            },
        })
    }
}

#[derive(Default)]
struct FakePageHost {
    claims: AtomicUsize,
}

#[async_trait]
impl PageHost for FakePageHost {
    async fn reload(&self) -> BridgeResult<()> {
        Ok(())
    }

    async fn claim(&self) -> BridgeResult<()> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

const ORIGIN: &str = "https://reader.example.com";

fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

fn abs(path: &str) -> String {
    origin().join(path).unwrap().to_string()
}

fn request(path: &str, destination: RequestDestination) -> PageRequest {
    PageRequest::asset(origin().join(path).unwrap(), destination)
}

fn worker_with(
    epoch: &str,
    fetch: Arc<FakeFetch>,
    store: Arc<dyn CacheStore>,
    pages: Arc<FakePageHost>,
    shell: Vec<String>,
    videos: Vec<String>,
) -> InterceptionWorker {
    InterceptionWorker::new(
        BuildVersion::new(epoch),
        TierSet::new(epoch, Vec::new()),
        store,
        fetch,
        pages,
        RoutePolicy::default(),
        origin(),
        shell,
        videos,
    )
}

async fn installed_worker(fetch: Arc<FakeFetch>, store: Arc<dyn CacheStore>) -> InterceptionWorker {
    let worker = worker_with("v1", fetch, store, Arc::new(FakePageHost::default()), Vec::new(), Vec::new());
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    worker
}

#[tokio::test]
async fn test_install_persists_shell_and_fails_on_missing_asset() {
    let fetch = Arc::new(
        FakeFetch::new()
            .route(&abs("/index.html"), b"<html>shell</html>")
            .route(&abs("/app.js"), b"js"),
    );
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let pages = Arc::new(FakePageHost::default());

    let worker = worker_with(
        "v1",
        Arc::clone(&fetch),
        Arc::clone(&store),
        Arc::clone(&pages),
        vec!["/index.html".into(), "/app.js".into()],
        Vec::new(),
    );
    worker.install().await.unwrap();
    assert_eq!(worker.state(), WorkerState::Installed);

    let shell_tier = TierName::new(TierKind::Shell, "v1");
    assert_eq!(store.keys(&shell_tier).await.unwrap().len(), 2);

    // A worker whose shell cannot be fetched fails install outright.
    let broken = worker_with(
        "v2",
        Arc::clone(&fetch),
        Arc::clone(&store),
        pages,
        vec!["/missing.css".into()],
        Vec::new(),
    );
    assert!(broken.install().await.is_err());
    assert_eq!(broken.state(), WorkerState::Failed);
}

#[tokio::test]
async fn test_video_preload_failure_is_not_install_fatal() {
    let fetch = Arc::new(FakeFetch::new().route(&abs("/index.html"), b"shell"));
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());

    let worker = worker_with(
        "v1",
        fetch,
        store,
        Arc::new(FakePageHost::default()),
        vec!["/index.html".into()],
        vec!["/media/missing-loop.mp4".into()],
    );

    worker.install().await.unwrap();
    assert_eq!(worker.state(), WorkerState::Installed);
}

#[tokio::test]
async fn test_activate_drops_stale_epoch_tiers_and_claims() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let stale = TierName::new(TierKind::Pages, "v1");
    store.put(&stale, "/library", Bytes::from_static(b"old")).await.unwrap();

    let fetch = Arc::new(FakeFetch::new());
    let pages = Arc::new(FakePageHost::default());
    let worker = worker_with(
        "v2",
        fetch,
        Arc::clone(&store),
        Arc::clone(&pages),
        Vec::new(),
        Vec::new(),
    );
    worker.install().await.unwrap();
    worker.activate().await.unwrap();

    assert_eq!(worker.state(), WorkerState::Active);
    assert_eq!(pages.claims.load(Ordering::SeqCst), 1);

    let remaining = store.list_tiers().await.unwrap();
    assert!(!remaining.contains(&stale));
}

#[tokio::test]
async fn test_non_get_and_cross_origin_pass_through() {
    let fetch = Arc::new(FakeFetch::new());
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let worker = installed_worker(Arc::clone(&fetch), store).await;

    let post = PageRequest::new(
        HttpMethod::Post,
        origin().join("/api/progress").unwrap(),
        RequestDestination::Other,
    );
    assert!(matches!(worker.resolve(&post).await, Resolution::PassThrough));

    let cross = PageRequest::asset(
        Url::parse("https://cdn.example.com/font.woff2").unwrap(),
        RequestDestination::Font,
    );
    assert!(matches!(worker.resolve(&cross).await, Resolution::PassThrough));
    assert_eq!(fetch.fetch_count(), 0);
}

#[tokio::test]
async fn test_video_miss_with_no_network_is_typed_placeholder() {
    let fetch = Arc::new(FakeFetch::new());
    fetch.set_offline(true);
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let worker = installed_worker(Arc::clone(&fetch), store).await;

    let resolution = worker
        .resolve(&request("/media/ambient.mp4", RequestDestination::Video))
        .await;
    assert_eq!(resolution.placeholder(), Some(PlaceholderKind::Unavailable));
}

#[tokio::test]
async fn test_video_cache_first_after_network_fill() {
    let fetch = Arc::new(FakeFetch::new().route(&abs("/media/ambient.mp4"), b"frames"));
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let worker = installed_worker(Arc::clone(&fetch), store).await;
    let video = request("/media/ambient.mp4", RequestDestination::Video);

    match worker.resolve(&video).await {
        Resolution::Served { from, .. } => assert_eq!(from, ServedFrom::Network),
        other => panic!("expected served, got {other:?}"),
    }

    // Second request is served from the video tier even with the network
    // gone.
    fetch.set_offline(true);
    match worker.resolve(&video).await {
        Resolution::Served { body, from } => {
            assert_eq!(from, ServedFrom::Tier(TierKind::Video));
            assert_eq!(body, Bytes::from_static(b"frames"));
        }
        other => panic!("expected served, got {other:?}"),
    }
}

#[tokio::test]
async fn test_audio_falls_back_to_downloaded_unit() {
    let fetch = Arc::new(FakeFetch::new());
    fetch.set_offline(true);
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());

    // The orchestrator persisted this unit's narration earlier.
    let offline_tier = TierName::new(TierKind::OfflineDocs, "v1");
    let id = UnitId::new("chapter-1");
    store
        .put(&offline_tier, &audio_key(&id), Bytes::from_static(b"narration"))
        .await
        .unwrap();

    let worker = installed_worker(Arc::clone(&fetch), Arc::clone(&store)).await;

    let resolution = worker
        .resolve(&request("/audio/chapter-1.mp3", RequestDestination::Audio))
        .await;
    match resolution {
        Resolution::Served { body, from } => {
            assert_eq!(from, ServedFrom::Tier(TierKind::OfflineDocs));
            assert_eq!(body, Bytes::from_static(b"narration"));
        }
        other => panic!("expected served, got {other:?}"),
    }

    // A narration that was never downloaded reads as not-available-offline.
    let miss = worker
        .resolve(&request("/audio/chapter-2.mp3", RequestDestination::Audio))
        .await;
    assert_eq!(miss.placeholder(), Some(PlaceholderKind::NotAvailableOffline));
}

#[tokio::test]
async fn test_offline_doc_cache_first_with_network_fallback() {
    let fetch = Arc::new(FakeFetch::new().route(&abs("/content/story-9.json"), b"from network"));
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());

    let offline_tier = TierName::new(TierKind::OfflineDocs, "v1");
    let downloaded = UnitId::new("chapter-1");
    store
        .put(&offline_tier, &text_key(&downloaded), Bytes::from_static(b"from cache"))
        .await
        .unwrap();

    let worker = installed_worker(Arc::clone(&fetch), Arc::clone(&store)).await;

    match worker
        .resolve(&request("/content/chapter-1.json", RequestDestination::Other))
        .await
    {
        Resolution::Served { body, from } => {
            assert_eq!(from, ServedFrom::Tier(TierKind::OfflineDocs));
            assert_eq!(body, Bytes::from_static(b"from cache"));
        }
        other => panic!("expected served, got {other:?}"),
    }

    // Not downloaded: network fallback, without writing the offline tier.
    match worker
        .resolve(&request("/content/story-9.json", RequestDestination::Other))
        .await
    {
        Resolution::Served { from, .. } => assert_eq!(from, ServedFrom::Network),
        other => panic!("expected served, got {other:?}"),
    }
    let offline_keys = store.keys(&offline_tier).await.unwrap();
    assert_eq!(offline_keys, vec![text_key(&downloaded)]);
}

#[tokio::test]
async fn test_dynamic_network_first_then_cache_fallback() {
    let fetch = Arc::new(FakeFetch::new().route(&abs("/library"), b"library page"));
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let worker = installed_worker(Arc::clone(&fetch), store).await;
    let library = PageRequest::navigation(origin().join("/library").unwrap());

    match worker.resolve(&library).await {
        Resolution::Served { from, .. } => assert_eq!(from, ServedFrom::Network),
        other => panic!("expected served, got {other:?}"),
    }

    fetch.set_offline(true);
    match worker.resolve(&library).await {
        Resolution::Served { body, from } => {
            assert_eq!(from, ServedFrom::Tier(TierKind::Pages));
            assert_eq!(body, Bytes::from_static(b"library page"));
        }
        other => panic!("expected served, got {other:?}"),
    }
}

#[tokio::test]
async fn test_uncached_navigation_falls_back_to_shell() {
    let fetch = Arc::new(FakeFetch::new().route(&abs("/index.html"), b"shell document"));
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let pages = Arc::new(FakePageHost::default());

    let worker = worker_with(
        "v1",
        Arc::clone(&fetch),
        store,
        pages,
        vec!["/index.html".into()],
        Vec::new(),
    );
    worker.install().await.unwrap();
    worker.activate().await.unwrap();

    fetch.set_offline(true);

    // Navigation to a page never cached: the app still boots via the shell.
    let navigation = PageRequest::navigation(origin().join("/settings").unwrap());
    match worker.resolve(&navigation).await {
        Resolution::Served { body, from } => {
            assert_eq!(from, ServedFrom::ShellFallback);
            assert_eq!(body, Bytes::from_static(b"shell document"));
        }
        other => panic!("expected served, got {other:?}"),
    }

    // A non-navigation asset miss stays a typed placeholder.
    let asset = request("/theme.css", RequestDestination::Style);
    assert_eq!(
        worker.resolve(&asset).await.placeholder(),
        Some(PlaceholderKind::Unavailable)
    );
}

#[tokio::test]
async fn test_runtime_first_worker_activates_immediately() {
    let fetch = Arc::new(FakeFetch::new());
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let host = LocalWorkerHost::new();
    let registry = host.registry();

    let worker = Arc::new(worker_with(
        "v1",
        fetch,
        store,
        Arc::new(FakePageHost::default()),
        Vec::new(),
        Vec::new(),
    ));
    host.spawn(Arc::clone(&worker)).await.unwrap();

    assert_eq!(worker.state(), WorkerState::Active);
    assert_eq!(registry.waiting_build().await.unwrap(), None);
    assert_eq!(
        registry.controlling_build().await.unwrap(),
        Some(BuildVersion::new("v1"))
    );
}

#[tokio::test]
async fn test_runtime_second_worker_waits_for_skip_waiting() {
    let fetch = Arc::new(FakeFetch::new());
    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
    let host = LocalWorkerHost::new();
    let registry = host.registry();

    let first = Arc::new(worker_with(
        "v1",
        Arc::clone(&fetch),
        Arc::clone(&store),
        Arc::new(FakePageHost::default()),
        Vec::new(),
        Vec::new(),
    ));
    host.spawn(first).await.unwrap();

    let second = Arc::new(worker_with(
        "v2",
        fetch,
        Arc::clone(&store),
        Arc::new(FakePageHost::default()),
        Vec::new(),
        Vec::new(),
    ));
    let second_task = host.spawn(Arc::clone(&second));

    // The second worker installs, then parks as waiting.
    let mut changes = registry.subscribe_controller_changes().await.unwrap();
    tokio::task::yield_now().await;
    while registry.waiting_build().await.unwrap().is_none() {
        tokio::task::yield_now().await;
    }
    assert_eq!(second.state(), WorkerState::Installed);

    registry.skip_waiting(Uuid::new_v4()).await.unwrap();
    second_task.await.unwrap();

    assert_eq!(second.state(), WorkerState::Active);
    assert_eq!(changes.next().await, Some(BuildVersion::new("v2")));
    assert_eq!(registry.waiting_build().await.unwrap(), None);
    assert_eq!(
        registry.controlling_build().await.unwrap(),
        Some(BuildVersion::new("v2"))
    );

    // The v1 epoch's tiers were garbage-collected during activation.
    let remaining = store.list_tiers().await.unwrap();
    assert!(remaining.iter().all(|tier| tier.epoch() != Some("v1")));
}
