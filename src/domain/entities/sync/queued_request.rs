use crate::domain::value_objects::{HttpMethod, RequestId, RequestPayload, ResourcePath};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mutating request accepted while offline, persisted until it has been
/// replayed against the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedRequest {
    pub id: RequestId,
    pub created_at: DateTime<Utc>,
    pub method: HttpMethod,
    pub path: ResourcePath,
    pub payload: Option<RequestPayload>,
    /// Most recent replay failure, kept for diagnostics; cleared only when
    /// the entry leaves the queue.
    pub last_error: Option<String>,
}

/// Enqueue input before an identifier and timestamp have been assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedRequestDraft {
    pub method: HttpMethod,
    pub path: ResourcePath,
    pub payload: Option<RequestPayload>,
}

impl QueuedRequestDraft {
    pub fn new(method: HttpMethod, path: ResourcePath, payload: Option<RequestPayload>) -> Self {
        Self {
            method,
            path,
            payload,
        }
    }
}

impl QueuedRequest {
    pub fn from_draft(draft: QueuedRequestDraft) -> Self {
        Self {
            id: RequestId::generate(),
            created_at: Utc::now(),
            method: draft.method,
            path: draft.path,
            payload: draft.payload,
            last_error: None,
        }
    }

    pub fn with_last_error(mut self, message: Option<String>) -> Self {
        self.last_error = message;
        self
    }
}
