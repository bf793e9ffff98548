use crate::application::services::{
    ConnectivityService, MutationService, QueryCacheService, RequestQueueService,
};
use crate::domain::entities::sync::{MutationOutcome, QueuedRequest, QueuedRequestDraft, RequestDescriptor};
use crate::domain::value_objects::{HttpMethod, RequestPayload, ResourcePath};
use crate::presentation::dto::Validate;
use crate::presentation::dto::sync::{
    CacheStatusResponse, EnqueueRequestDto, MutationRequestDto, MutationResponseDto,
    QueuedRequestDto, SyncStatusResponse,
};
use crate::shared::AppError;
use crate::shared::metrics::{DrainMetrics, DrainMetricsSnapshot};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

pub use crate::application::services::queue_service::DrainReport;

/// Facade the UI bridge calls. Validates DTOs, maps them onto domain types,
/// and maps service results back into response shapes.
pub struct SyncHandler {
    connectivity: Arc<ConnectivityService>,
    queue: RequestQueueService,
    mutations: MutationService,
    cache: QueryCacheService,
    metrics: Arc<DrainMetrics>,
}

impl SyncHandler {
    pub fn new(
        connectivity: Arc<ConnectivityService>,
        queue: RequestQueueService,
        mutations: MutationService,
        cache: QueryCacheService,
        metrics: Arc<DrainMetrics>,
    ) -> Self {
        Self {
            connectivity,
            queue,
            mutations,
            cache,
            metrics,
        }
    }

    pub async fn enqueue_request(
        &self,
        request: EnqueueRequestDto,
    ) -> Result<QueuedRequestDto, AppError> {
        request.validate()?;

        let draft = QueuedRequestDraft::new(
            parse_method(&request.method)?,
            parse_path(&request.path)?,
            parse_payload(request.payload)?,
        );
        let queued = self.queue.enqueue(draft).await?;
        Ok(map_queued_request(&queued))
    }

    pub async fn process_queue(&self) -> Result<DrainReport, AppError> {
        self.queue.drain().await
    }

    pub async fn execute_mutation(
        &self,
        request: MutationRequestDto,
    ) -> Result<MutationResponseDto, AppError> {
        request.validate()?;

        let descriptor = RequestDescriptor::new(
            parse_method(&request.method)?,
            parse_path(&request.path)?,
        );
        let outcome = self
            .mutations
            .execute(descriptor, parse_payload(request.payload)?)
            .await?;

        Ok(match outcome {
            MutationOutcome::Executed(data) => MutationResponseDto {
                data,
                queued: false,
                request_id: None,
            },
            MutationOutcome::Queued(request) => MutationResponseDto {
                data: request
                    .payload
                    .as_ref()
                    .map(|payload| payload.as_json().clone())
                    .unwrap_or(Value::Null),
                queued: true,
                request_id: Some(request.id.to_string()),
            },
        })
    }

    pub async fn pending_requests(&self) -> Result<Vec<QueuedRequestDto>, AppError> {
        let pending = self.queue.pending_requests().await?;
        Ok(pending.iter().map(map_queued_request).collect())
    }

    pub fn sync_status(&self) -> SyncStatusResponse {
        let state = self.connectivity.current();
        SyncStatusResponse {
            is_online: state.is_online,
            network_type: state.network_type.as_str().to_string(),
            queue_size: self.queue.queue_size(),
            is_syncing: self.queue.is_syncing(),
        }
    }

    pub async fn cache_status(&self) -> CacheStatusResponse {
        CacheStatusResponse {
            entry_count: self.cache.entry_count().await,
            stale_count: self.cache.stale_count().await,
            last_persisted_at: self
                .cache
                .last_persisted_at()
                .await
                .map(|ts| ts.timestamp()),
        }
    }

    pub fn drain_metrics(&self) -> DrainMetricsSnapshot {
        self.metrics.snapshot()
    }
}

fn parse_method(value: &str) -> Result<HttpMethod, AppError> {
    HttpMethod::from_str(value).map_err(AppError::validation)
}

fn parse_path(value: &str) -> Result<ResourcePath, AppError> {
    ResourcePath::parse(value).map_err(AppError::validation)
}

fn parse_payload(value: Option<Value>) -> Result<Option<RequestPayload>, AppError> {
    value
        .map(|v| RequestPayload::new(v).map_err(AppError::validation))
        .transpose()
}

fn map_queued_request(request: &QueuedRequest) -> QueuedRequestDto {
    QueuedRequestDto {
        id: request.id.to_string(),
        created_at: request.created_at.timestamp(),
        method: request.method.as_str().to_string(),
        path: request.path.to_string(),
        payload: request
            .payload
            .as_ref()
            .map(|payload| payload.as_json().clone()),
        last_error: request.last_error.clone(),
    }
}
