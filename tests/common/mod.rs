#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use wayfare_lib::application::ports::{BackendTransport, KeyValueStore, ReachabilityProbe};
use wayfare_lib::application::services::{
    ConnectivityService, MutationService, QueryCacheService, RequestQueueService,
};
use wayfare_lib::domain::entities::sync::{ConnectivityState, QueuedRequestDraft};
use wayfare_lib::domain::value_objects::{HttpMethod, NetworkType, RequestPayload, ResourcePath};
use wayfare_lib::infrastructure::database::ConnectionPool;
use wayfare_lib::infrastructure::storage::SqliteKvStore;
use wayfare_lib::shared::config::CacheConfig;
use wayfare_lib::shared::error::AppError;
use wayfare_lib::shared::metrics::DrainMetrics;

/// Reachability fake whose answer the test flips to simulate losing and
/// regaining the network.
pub struct SwitchableProbe {
    online: AtomicBool,
}

impl SwitchableProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReachabilityProbe for SwitchableProbe {
    async fn probe(&self) -> ConnectivityState {
        if self.online.load(Ordering::SeqCst) {
            ConnectivityState::online(NetworkType::Wifi)
        } else {
            ConnectivityState::offline()
        }
    }
}

/// Backend fake that records every call and rejects configured paths.
pub struct ScriptedBackend {
    calls: Mutex<Vec<(HttpMethod, String, Option<Value>)>>,
    rejected: Mutex<HashSet<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            rejected: Mutex::new(HashSet::new()),
        }
    }

    pub async fn reject_path(&self, path: &str) {
        self.rejected.lock().await.insert(path.to_string());
    }

    pub async fn accept_all(&self) {
        self.rejected.lock().await.clear();
    }

    pub async fn calls(&self) -> Vec<(HttpMethod, String, Option<Value>)> {
        self.calls.lock().await.clone()
    }

    pub async fn called_paths(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|(_, path, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl BackendTransport for ScriptedBackend {
    async fn execute(
        &self,
        method: HttpMethod,
        path: &ResourcePath,
        payload: Option<&Value>,
    ) -> Result<Value, AppError> {
        self.calls
            .lock()
            .await
            .push((method, path.to_string(), payload.cloned()));
        if self.rejected.lock().await.contains(path.as_str()) {
            return Err(AppError::Network("402 Payment Required".to_string()));
        }
        Ok(json!({ "ok": true }))
    }
}

/// The sync core wired over a real sqlite store and scripted collaborators.
pub struct TestHarness {
    pub pool: ConnectionPool,
    pub backend: Arc<ScriptedBackend>,
    pub probe: Arc<SwitchableProbe>,
    pub connectivity: Arc<ConnectivityService>,
    pub queue: RequestQueueService,
    pub mutations: MutationService,
    pub cache: QueryCacheService,
    pub metrics: Arc<DrainMetrics>,
}

pub fn cache_config() -> CacheConfig {
    CacheConfig {
        snapshot_interval: 300,
        max_snapshot_age_hours: 24,
        stale_time: 300,
    }
}

pub async fn harness(online: bool) -> TestHarness {
    let pool = ConnectionPool::from_memory().await.expect("memory pool");
    harness_with_pool(pool, online).await
}

pub async fn harness_with_pool(pool: ConnectionPool, online: bool) -> TestHarness {
    pool.initialize_schema().await.expect("schema");
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new(pool.get_pool().clone()));

    let backend = Arc::new(ScriptedBackend::new());
    let probe = Arc::new(SwitchableProbe::new(online));
    let connectivity = Arc::new(ConnectivityService::new(probe.clone()));
    connectivity.refresh().await;

    let metrics = Arc::new(DrainMetrics::new());
    let queue = RequestQueueService::new(
        store.clone(),
        backend.clone(),
        connectivity.clone(),
        metrics.clone(),
    );
    queue.bootstrap().await.expect("bootstrap");
    let mutations = MutationService::new(connectivity.clone(), backend.clone(), queue.clone());
    let cache = QueryCacheService::new(store, &cache_config());

    TestHarness {
        pool,
        backend,
        probe,
        connectivity,
        queue,
        mutations,
        cache,
        metrics,
    }
}

pub fn post_draft(path: &str, payload: Value) -> QueuedRequestDraft {
    QueuedRequestDraft::new(
        HttpMethod::Post,
        ResourcePath::parse(path).expect("path"),
        Some(RequestPayload::new(payload).expect("payload")),
    )
}

/// Poll until `check` passes or the timeout elapses.
pub async fn wait_until<F>(timeout: Duration, mut check: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
