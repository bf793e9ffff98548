use crate::application::ports::KeyValueStore;
use crate::application::services::sync_events::SyncEvent;
use crate::domain::entities::sync::{CacheSnapshot, CachedQueryEntry};
use crate::domain::value_objects::QueryKey;
use crate::shared::config::CacheConfig;
use crate::shared::error::AppError;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio::task::JoinHandle;

/// Storage key the serialized cache snapshot lives under.
pub const CACHE_SNAPSHOT_KEY: &str = "sync::query_cache";

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Fresh cache hit, no network involved.
    Cache,
    /// Fetched from the backend just now.
    Network,
    /// Stale cache served because the refetch failed (offline mode).
    StaleCache,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup {
    pub data: Value,
    pub source: CacheSource,
    pub fetched_at: DateTime<Utc>,
}

/// In-memory query cache with a durable snapshot boundary.
///
/// The snapshot is one opaque blob under a single key: restored wholesale at
/// startup when younger than the configured bound, discarded wholesale
/// otherwise. A corrupt blob degrades to an empty cache, equivalent to a
/// first-ever launch. Per-query staleness is independent of, and much
/// shorter than, the snapshot age bound.
#[derive(Clone)]
pub struct QueryCacheService {
    store: Arc<dyn KeyValueStore>,
    entries: Arc<RwLock<HashMap<String, CachedQueryEntry>>>,
    last_persisted_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    stale_time: Duration,
    max_snapshot_age: Duration,
}

impl QueryCacheService {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            entries: Arc::new(RwLock::new(HashMap::new())),
            last_persisted_at: Arc::new(RwLock::new(None)),
            stale_time: Duration::seconds(config.stale_time as i64),
            max_snapshot_age: Duration::hours(config.max_snapshot_age_hours as i64),
        }
    }

    /// Restore the persisted snapshot. Returns the number of entries loaded;
    /// zero for a missing, expired, or corrupt snapshot.
    pub async fn restore(&self) -> Result<usize, AppError> {
        let raw = match self.store.get(CACHE_SNAPSHOT_KEY).await? {
            Some(raw) => raw,
            None => return Ok(0),
        };

        let snapshot: CacheSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                // Corrupt snapshots are never fatal at startup.
                tracing::warn!(error = %e, "discarding corrupt cache snapshot");
                if let Err(remove_err) = self.store.remove(CACHE_SNAPSHOT_KEY).await {
                    tracing::warn!(error = %remove_err, "failed to remove corrupt snapshot");
                }
                return Ok(0);
            }
        };

        if snapshot.is_expired(self.max_snapshot_age, Utc::now()) {
            tracing::info!(
                persisted_at = %snapshot.persisted_at,
                "cache snapshot exceeded the age bound; starting empty"
            );
            self.store.remove(CACHE_SNAPSHOT_KEY).await?;
            return Ok(0);
        }

        let count = snapshot.entries.len();
        *self.entries.write().await = snapshot.entries;
        *self.last_persisted_at.write().await = Some(snapshot.persisted_at);
        tracing::info!(entries = count, "restored query cache from snapshot");
        Ok(count)
    }

    /// Write the whole cache as one snapshot blob.
    pub async fn persist(&self) -> Result<(), AppError> {
        let entries = self.entries.read().await.clone();
        let snapshot = CacheSnapshot::new(entries);
        let raw = serde_json::to_string(&snapshot)?;
        self.store.set(CACHE_SNAPSHOT_KEY, &raw).await?;
        *self.last_persisted_at.write().await = Some(snapshot.persisted_at);
        Ok(())
    }

    /// Serve from cache when fresh; otherwise fetch, falling back to stale
    /// data when the fetch fails and any is available.
    pub async fn resolve<F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<CacheLookup, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, AppError>>,
    {
        let now = Utc::now();
        let cached = self.entries.read().await.get(key.as_str()).cloned();

        match cached {
            Some(entry) if entry.is_fresh(self.stale_time, now) => Ok(CacheLookup {
                data: entry.data,
                source: CacheSource::Cache,
                fetched_at: entry.fetched_at,
            }),
            Some(entry) => match fetcher().await {
                Ok(data) => {
                    self.put(key, data.clone()).await;
                    Ok(CacheLookup {
                        data,
                        source: CacheSource::Network,
                        fetched_at: Utc::now(),
                    })
                }
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "refetch failed; serving stale cache");
                    Ok(CacheLookup {
                        data: entry.data,
                        source: CacheSource::StaleCache,
                        fetched_at: entry.fetched_at,
                    })
                }
            },
            None => {
                let data = fetcher().await?;
                self.put(key, data.clone()).await;
                Ok(CacheLookup {
                    data,
                    source: CacheSource::Network,
                    fetched_at: Utc::now(),
                })
            }
        }
    }

    pub async fn put(&self, key: &QueryKey, data: Value) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), CachedQueryEntry::new(data));
    }

    pub async fn get(&self, key: &QueryKey) -> Option<CachedQueryEntry> {
        self.entries.read().await.get(key.as_str()).cloned()
    }

    /// Mark one query eligible for refetch while keeping its data renderable.
    pub async fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.entries.write().await.get_mut(key.as_str()) {
            entry.stale = true;
        }
    }

    /// Global invalidation after a full queue drain: optimistic local state
    /// must yield to server-confirmed state on the next fetch.
    pub async fn mark_all_stale(&self) {
        let mut entries = self.entries.write().await;
        for entry in entries.values_mut() {
            entry.stale = true;
        }
        tracing::debug!(entries = entries.len(), "marked all cached queries stale");
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn stale_count(&self) -> usize {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_fresh(self.stale_time, now))
            .count()
    }

    pub async fn last_persisted_at(&self) -> Option<DateTime<Utc>> {
        *self.last_persisted_at.read().await
    }

    /// Listen for queue events and mark every cached query stale once the
    /// queue has fully drained. This event interface is the only coupling
    /// between the queue and the cache.
    pub fn spawn_invalidation_listener(
        &self,
        mut events: broadcast::Receiver<SyncEvent>,
    ) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SyncEvent::QueueDrained { replayed }) => {
                        tracing::debug!(replayed, "queue drained; invalidating cached queries");
                        cache.mark_all_stale().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "sync event listener lagged; invalidating cache");
                        cache.mark_all_stale().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Snapshot the cache on a timer. Aborting the handle stops the task; a
    /// final explicit `persist` at shutdown is the caller's responsibility.
    pub fn spawn_snapshot_task(&self, interval: std::time::Duration) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = service.persist().await {
                    tracing::warn!(error = %e, "cache snapshot write failed");
                }
            }
        })
    }
}
