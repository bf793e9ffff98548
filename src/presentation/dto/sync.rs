use crate::presentation::dto::Validate;
use crate::shared::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::domain::value_objects::HttpMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequestDto {
    pub method: String,
    pub path: String,
    pub payload: Option<Value>,
}

impl Validate for EnqueueRequestDto {
    fn validate(&self) -> Result<(), AppError> {
        HttpMethod::from_str(&self.method).map_err(AppError::validation)?;
        if self.path.trim().is_empty() {
            return Err(AppError::validation("Request path is required"));
        }
        if matches!(self.payload, Some(Value::Null)) {
            return Err(AppError::validation("Payload must not be null"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequestDto {
    pub method: String,
    pub path: String,
    pub payload: Option<Value>,
}

impl Validate for MutationRequestDto {
    fn validate(&self) -> Result<(), AppError> {
        HttpMethod::from_str(&self.method).map_err(AppError::validation)?;
        if self.path.trim().is_empty() {
            return Err(AppError::validation("Request path is required"));
        }
        if matches!(self.payload, Some(Value::Null)) {
            return Err(AppError::validation("Payload must not be null"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequestDto {
    pub id: String,
    pub created_at: i64,
    pub method: String,
    pub path: String,
    pub payload: Option<Value>,
    pub last_error: Option<String>,
}

/// Shaped like a normal mutation result so calling screens treat queued and
/// direct writes identically; `queued` is the only distinguishing tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponseDto {
    pub data: Value,
    pub queued: bool,
    pub request_id: Option<String>,
}

/// Everything the offline indicator banner needs; it renders nothing when
/// `is_online` is true and `queue_size` is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub is_online: bool,
    pub network_type: String,
    pub queue_size: usize,
    pub is_syncing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusResponse {
    pub entry_count: usize,
    pub stale_count: usize,
    pub last_persisted_at: Option<i64>,
}
