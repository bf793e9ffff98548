use crate::application::ports::{BackendTransport, KeyValueStore};
use crate::application::services::connectivity_service::ConnectivityService;
use crate::application::services::sync_events::SyncEvent;
use crate::domain::entities::sync::{ConnectivityState, QueuedRequest, QueuedRequestDraft};
use crate::shared::error::AppError;
use crate::shared::metrics::DrainMetrics;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;

/// Storage key the serialized queue lives under. Removed entirely when the
/// queue empties; never written as an empty list.
pub const REQUEST_QUEUE_KEY: &str = "sync::request_queue";

/// Outcome of one `drain` call.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    pub replayed: u32,
    pub failed: u32,
    pub remaining: u32,
    /// True when the call was a no-op because another drain held the guard.
    pub skipped: bool,
}

impl DrainReport {
    fn skipped() -> Self {
        Self {
            replayed: 0,
            failed: 0,
            remaining: 0,
            skipped: true,
        }
    }

    fn empty() -> Self {
        Self {
            replayed: 0,
            failed: 0,
            remaining: 0,
            skipped: false,
        }
    }
}

/// Durable FIFO queue of mutating requests accepted while offline.
///
/// Guarantees: an accepted request is never lost and never silently
/// duplicated; replay order equals enqueue order. Failed items stay in place
/// while later items are still attempted in the same pass (best-effort
/// skip-ahead), and are retried from the front on the next pass.
#[derive(Clone)]
pub struct RequestQueueService {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn BackendTransport>,
    connectivity: Arc<ConnectivityService>,
    metrics: Arc<DrainMetrics>,
    events: broadcast::Sender<SyncEvent>,
    /// Serializes every read-modify-write of the queue blob.
    storage_lock: Arc<Mutex<()>>,
    /// Reentrancy guard for `drain`. In-memory only: a restart mid-drain
    /// resumes with every unconfirmed item still queued.
    processing: Arc<AtomicBool>,
    queue_len: Arc<AtomicUsize>,
}

impl RequestQueueService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn BackendTransport>,
        connectivity: Arc<ConnectivityService>,
        metrics: Arc<DrainMetrics>,
    ) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store,
            backend,
            connectivity,
            metrics,
            events,
            storage_lock: Arc::new(Mutex::new(())),
            processing: Arc::new(AtomicBool::new(false)),
            queue_len: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Load the persisted queue once at startup so `queue_size` reflects
    /// requests left over from a previous run.
    pub async fn bootstrap(&self) -> Result<usize, AppError> {
        let _guard = self.storage_lock.lock().await;
        let queue = self.load_queue().await?;
        self.queue_len.store(queue.len(), Ordering::SeqCst);
        Ok(queue.len())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn queue_size(&self) -> usize {
        self.queue_len.load(Ordering::SeqCst)
    }

    pub fn is_syncing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Append a request to durable storage. Returns only after the write
    /// lands. When the device is currently online, an opportunistic drain is
    /// kicked off in the background.
    pub async fn enqueue(&self, draft: QueuedRequestDraft) -> Result<QueuedRequest, AppError> {
        let request = QueuedRequest::from_draft(draft);
        {
            let _guard = self.storage_lock.lock().await;
            let mut queue = self.load_queue().await?;
            queue.push(request.clone());
            self.persist_queue(&queue).await?;
        }
        tracing::debug!(
            id = %request.id,
            method = %request.method,
            path = %request.path,
            "request queued for replay"
        );

        if self.connectivity.is_online() {
            let service = self.clone();
            tokio::spawn(async move {
                if let Err(e) = service.drain().await {
                    tracing::warn!(error = %e, "opportunistic drain failed");
                }
            });
        }

        Ok(request)
    }

    /// Replay the queue against the backend, in insertion order.
    ///
    /// Reentrant-safe: a call while a pass is in flight is a no-op. Per-item
    /// transport failures are logged and the item retained; storage failures
    /// propagate, since they mean the queue's own medium is gone.
    pub async fn drain(&self) -> Result<DrainReport, AppError> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("drain already in progress; skipping");
            return Ok(DrainReport::skipped());
        }

        let result = self.drain_pass().await;
        self.processing.store(false, Ordering::SeqCst);
        result
    }

    async fn drain_pass(&self) -> Result<DrainReport, AppError> {
        let snapshot = {
            let _guard = self.storage_lock.lock().await;
            self.load_queue().await?
        };
        if snapshot.is_empty() {
            return Ok(DrainReport::empty());
        }

        tracing::info!(pending = snapshot.len(), "draining request queue");

        let mut resolved: HashSet<String> = HashSet::new();
        let mut failures: HashMap<String, String> = HashMap::new();
        for request in &snapshot {
            match self
                .backend
                .execute(
                    request.method,
                    &request.path,
                    request.payload.as_ref().map(|p| p.as_json()),
                )
                .await
            {
                Ok(_) => {
                    resolved.insert(request.id.to_string());
                }
                Err(e) => {
                    tracing::warn!(
                        id = %request.id,
                        path = %request.path,
                        error = %e,
                        "replay failed; request stays queued"
                    );
                    failures.insert(request.id.to_string(), e.to_string());
                }
            }
        }

        // Rewrite against the *current* queue: entries enqueued while the
        // pass was replaying must survive.
        let remaining = {
            let _guard = self.storage_lock.lock().await;
            let current = self.load_queue().await?;
            let remaining: Vec<QueuedRequest> = current
                .into_iter()
                .filter(|req| !resolved.contains(req.id.as_str()))
                .map(|req| match failures.get(req.id.as_str()) {
                    Some(message) => req.with_last_error(Some(message.clone())),
                    None => req,
                })
                .collect();
            self.persist_queue(&remaining).await?;
            remaining.len()
        };

        let replayed = resolved.len() as u32;
        let failed = failures.len() as u32;
        self.metrics.record_pass(replayed as u64, failed as u64);

        let report = DrainReport {
            replayed,
            failed,
            remaining: remaining as u32,
            skipped: false,
        };
        let _ = self.events.send(SyncEvent::DrainPassCompleted {
            replayed,
            failed,
            remaining: report.remaining,
        });
        if report.remaining == 0 && replayed > 0 {
            tracing::info!(replayed, "request queue fully drained");
            let _ = self.events.send(SyncEvent::QueueDrained { replayed });
        }

        Ok(report)
    }

    /// Drain whenever connectivity transitions offline → online.
    pub fn spawn_reconnect_drain(
        &self,
        mut rx: watch::Receiver<ConnectivityState>,
    ) -> JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            let mut was_online = rx.borrow_and_update().is_online;
            while rx.changed().await.is_ok() {
                let is_online = rx.borrow_and_update().is_online;
                if is_online && !was_online {
                    tracing::info!("connectivity restored; draining request queue");
                    if let Err(e) = queue.drain().await {
                        tracing::warn!(error = %e, "drain after reconnect failed");
                    }
                }
                was_online = is_online;
            }
        })
    }

    /// Retry leftovers on a timer so a queue whose reconnect drain failed is
    /// not stuck until the next connectivity transition.
    pub fn spawn_periodic_drain(&self, interval: std::time::Duration) -> JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if queue.connectivity.is_online() && queue.queue_size() > 0 {
                    if let Err(e) = queue.drain().await {
                        tracing::warn!(error = %e, "scheduled drain failed");
                    }
                }
            }
        })
    }

    /// Pending entries in replay order, for the status facade.
    pub async fn pending_requests(&self) -> Result<Vec<QueuedRequest>, AppError> {
        let _guard = self.storage_lock.lock().await;
        self.load_queue().await
    }

    async fn load_queue(&self) -> Result<Vec<QueuedRequest>, AppError> {
        match self.store.get(REQUEST_QUEUE_KEY).await? {
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|e| AppError::Storage(e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    /// The in-memory size indicator becomes authoritative only after the
    /// durable write has completed.
    async fn persist_queue(&self, queue: &[QueuedRequest]) -> Result<(), AppError> {
        if queue.is_empty() {
            self.store.remove(REQUEST_QUEUE_KEY).await?;
        } else {
            let raw = serde_json::to_string(queue)?;
            self.store.set(REQUEST_QUEUE_KEY, &raw).await?;
        }
        self.queue_len.store(queue.len(), Ordering::SeqCst);
        Ok(())
    }
}
