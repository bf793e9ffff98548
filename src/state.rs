use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::application::ports::{BackendTransport, KeyValueStore};
use crate::application::services::{
    ConnectivityService, MutationService, QueryCacheService, RequestQueueService,
};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::network::{HttpReachabilityProbe, RestBackend, SharedTokenProvider};
use crate::infrastructure::storage::SqliteKvStore;
use crate::presentation::handlers::SyncHandler;
use crate::shared::AppConfig;
use crate::shared::error::AppError;
use crate::shared::metrics::DrainMetrics;

/// アプリケーション全体の状態を管理する構造体
///
/// Every service is constructed exactly once here and shared by reference;
/// nothing in the crate keeps module-level mutable state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pool: ConnectionPool,
    pub tokens: SharedTokenProvider,
    pub connectivity: Arc<ConnectivityService>,
    pub queue: RequestQueueService,
    pub mutations: MutationService,
    pub cache: QueryCacheService,
    pub metrics: Arc<DrainMetrics>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().map_err(AppError::Configuration)?;

        ensure_database_dir(&config.database.url)?;
        let pool = ConnectionPool::new(&config.database.url, config.database.max_connections).await?;
        pool.initialize_schema().await?;
        let store: Arc<dyn KeyValueStore> = Arc::new(SqliteKvStore::new(pool.get_pool().clone()));

        let tokens = SharedTokenProvider::new();
        let backend: Arc<dyn BackendTransport> =
            Arc::new(RestBackend::new(&config.backend, Arc::new(tokens.clone()))?);
        let connectivity = Arc::new(ConnectivityService::new(Arc::new(
            HttpReachabilityProbe::new(&config.backend),
        )));
        let metrics = Arc::new(DrainMetrics::new());

        let queue = RequestQueueService::new(
            store.clone(),
            backend.clone(),
            connectivity.clone(),
            metrics.clone(),
        );
        let restored = queue.bootstrap().await?;
        if restored > 0 {
            tracing::info!(pending = restored, "request queue carried over from previous run");
        }

        let cache = QueryCacheService::new(store, &config.cache);
        cache.restore().await?;

        let mutations = MutationService::new(connectivity.clone(), backend, queue.clone());

        Ok(Self {
            config,
            pool,
            tokens,
            connectivity,
            queue,
            mutations,
            cache,
            metrics,
        })
    }

    /// The facade handed to the UI bridge.
    pub fn handler(&self) -> SyncHandler {
        SyncHandler::new(
            self.connectivity.clone(),
            self.queue.clone(),
            self.mutations.clone(),
            self.cache.clone(),
            self.metrics.clone(),
        )
    }

    /// Spawn the long-lived tasks: the connectivity monitor, the cache
    /// snapshot timer, the drain triggers, and the queue→cache invalidation
    /// bridge. Abort the handles to tear everything down; an in-flight drain
    /// still runs to completion.
    pub fn start_background_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut handles = vec![
            self.connectivity
                .spawn_monitor(Duration::from_secs(self.config.backend.probe_interval)),
            self.cache
                .spawn_snapshot_task(Duration::from_secs(self.config.cache.snapshot_interval)),
            self.cache
                .spawn_invalidation_listener(self.queue.subscribe_events()),
        ];
        if self.config.sync.auto_drain {
            handles.push(self.queue.spawn_reconnect_drain(self.connectivity.subscribe()));
            handles.push(
                self.queue
                    .spawn_periodic_drain(Duration::from_secs(self.config.sync.drain_interval)),
            );
        }
        handles
    }

    /// Persist a final cache snapshot and release the database.
    pub async fn shutdown(&self) {
        if let Err(e) = self.cache.persist().await {
            tracing::warn!(error = %e, "final cache snapshot failed");
        }
        self.pool.close().await;
    }
}

/// Create the parent directory of a file-backed sqlite database before the
/// pool tries to open it.
fn ensure_database_dir(database_url: &str) -> std::io::Result<()> {
    let Some(raw) = database_url.strip_prefix("sqlite:") else {
        return Ok(());
    };
    let path = raw.strip_prefix("//").unwrap_or(raw);
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
