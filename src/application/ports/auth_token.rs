use crate::shared::error::AppError;
use async_trait::async_trait;

/// Source of the bearer token attached to every outgoing backend call.
/// Token acquisition and storage live outside this core; replay always uses
/// whatever credentials are current at send time.
#[async_trait]
pub trait AuthTokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<Option<String>, AppError>;
}
