use crate::domain::value_objects::{HttpMethod, ResourcePath};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Uniform REST gateway used both for direct (online) mutations and for
/// queued-request replay. Response schemas are server-owned and opaque here.
#[async_trait]
pub trait BackendTransport: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        path: &ResourcePath,
        payload: Option<&Value>,
    ) -> Result<Value, AppError>;
}
