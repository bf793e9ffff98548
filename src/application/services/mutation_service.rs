use crate::application::ports::BackendTransport;
use crate::application::services::connectivity_service::ConnectivityService;
use crate::application::services::queue_service::RequestQueueService;
use crate::domain::entities::sync::{MutationOutcome, QueuedRequestDraft, RequestDescriptor};
use crate::domain::value_objects::RequestPayload;
use crate::shared::error::AppError;
use std::sync::Arc;

/// Uniform "perform this write" entry point: executes directly while online,
/// defers to the durable queue while offline.
///
/// The connectivity check races with the actual send; an online check
/// followed by a failing call propagates the transport error as-is and is
/// never retried into the queue.
#[derive(Clone)]
pub struct MutationService {
    connectivity: Arc<ConnectivityService>,
    backend: Arc<dyn BackendTransport>,
    queue: RequestQueueService,
}

impl MutationService {
    pub fn new(
        connectivity: Arc<ConnectivityService>,
        backend: Arc<dyn BackendTransport>,
        queue: RequestQueueService,
    ) -> Self {
        Self {
            connectivity,
            backend,
            queue,
        }
    }

    pub async fn execute(
        &self,
        descriptor: RequestDescriptor,
        payload: Option<RequestPayload>,
    ) -> Result<MutationOutcome, AppError> {
        if self.connectivity.is_online() {
            let value = self
                .backend
                .execute(
                    descriptor.method,
                    &descriptor.path,
                    payload.as_ref().map(|p| p.as_json()),
                )
                .await?;
            return Ok(MutationOutcome::Executed(value));
        }

        tracing::debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            "offline; deferring mutation to the request queue"
        );
        let request = self
            .queue
            .enqueue(QueuedRequestDraft::new(
                descriptor.method,
                descriptor.path,
                payload,
            ))
            .await?;
        Ok(MutationOutcome::Queued(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{KeyValueStore, ReachabilityProbe};
    use crate::domain::entities::sync::ConnectivityState;
    use crate::domain::value_objects::{HttpMethod, NetworkType, ResourcePath};
    use crate::infrastructure::storage::MemoryKvStore;
    use crate::shared::metrics::DrainMetrics;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::Mutex;

    struct FixedProbe(ConnectivityState);

    #[async_trait]
    impl ReachabilityProbe for FixedProbe {
        async fn probe(&self) -> ConnectivityState {
            self.0
        }
    }

    struct RecordingBackend {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingBackend {
        fn new(fail: bool) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl BackendTransport for RecordingBackend {
        async fn execute(
            &self,
            _method: HttpMethod,
            path: &ResourcePath,
            _payload: Option<&Value>,
        ) -> Result<Value, AppError> {
            self.calls.lock().await.push(path.to_string());
            if self.fail {
                return Err(AppError::Network("503 Service Unavailable".to_string()));
            }
            Ok(json!({ "balance": 1700 }))
        }
    }

    async fn setup(
        online: bool,
        backend_fails: bool,
    ) -> (MutationService, Arc<MemoryKvStore>, Arc<RecordingBackend>) {
        let state = if online {
            ConnectivityState::online(NetworkType::Wifi)
        } else {
            ConnectivityState::offline()
        };
        let connectivity = Arc::new(ConnectivityService::new(Arc::new(FixedProbe(state))));
        connectivity.refresh().await;

        let store = Arc::new(MemoryKvStore::new());
        let backend = Arc::new(RecordingBackend::new(backend_fails));
        let queue = RequestQueueService::new(
            store.clone(),
            backend.clone(),
            connectivity.clone(),
            Arc::new(DrainMetrics::new()),
        );
        (
            MutationService::new(connectivity, backend.clone(), queue),
            store,
            backend,
        )
    }

    fn topup() -> (RequestDescriptor, Option<RequestPayload>) {
        (
            RequestDescriptor::new(
                HttpMethod::Post,
                ResourcePath::parse("/wallet/topup").unwrap(),
            ),
            Some(RequestPayload::new(json!({ "amount": 500 })).unwrap()),
        )
    }

    #[tokio::test]
    async fn online_mutation_passes_through_untouched() {
        let (service, store, backend) = setup(true, false).await;
        let (descriptor, payload) = topup();

        let outcome = service.execute(descriptor, payload).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Executed(json!({ "balance": 1700 })));
        assert_eq!(backend.calls.lock().await.len(), 1);

        // the queue was never touched
        assert!(
            store
                .get(crate::application::services::queue_service::REQUEST_QUEUE_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn online_failure_propagates_unchanged() {
        let (service, store, _backend) = setup(true, true).await;
        let (descriptor, payload) = topup();

        let err = service.execute(descriptor, payload).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(err.to_string().contains("503"));

        // a mid-flight failure is not retried into the queue
        assert!(
            store
                .get(crate::application::services::queue_service::REQUEST_QUEUE_KEY)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn offline_mutation_is_queued_with_optimistic_payload() {
        let (service, store, backend) = setup(false, false).await;
        let (descriptor, payload) = topup();

        let outcome = service.execute(descriptor, payload).await.unwrap();
        assert!(outcome.is_queued());
        assert_eq!(outcome.display_data(), json!({ "amount": 500 }));
        assert!(backend.calls.lock().await.is_empty());

        let raw = store
            .get(crate::application::services::queue_service::REQUEST_QUEUE_KEY)
            .await
            .unwrap()
            .expect("queue blob persisted");
        assert!(raw.contains("/wallet/topup"));
    }
}
