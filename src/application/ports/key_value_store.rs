use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable key-value storage. The request queue and the cache snapshot each
/// live under their own key; a key has exactly one writing component.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Returns only after the value is durably written.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
