use crate::domain::entities::sync::QueuedRequest;
use crate::domain::value_objects::{HttpMethod, ResourcePath};
use serde_json::Value;

/// HTTP semantics of a mutation, supplied explicitly by the caller. The
/// wrapper never infers method or path from payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: ResourcePath,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: ResourcePath) -> Self {
        Self { method, path }
    }
}

/// Result of an offline-aware mutation: either the backend's real response,
/// or a locally synthesized acceptance for a queued request.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    Executed(Value),
    Queued(QueuedRequest),
}

impl MutationOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, MutationOutcome::Queued(_))
    }

    /// Data the UI should render: the server response for a direct call, the
    /// original payload (optimistic state) for a queued one.
    pub fn display_data(&self) -> Value {
        match self {
            MutationOutcome::Executed(value) => value.clone(),
            MutationOutcome::Queued(request) => request
                .payload
                .as_ref()
                .map(|payload| payload.as_json().clone())
                .unwrap_or(Value::Null),
        }
    }
}
