use crate::application::ports::{AuthTokenProvider, BackendTransport};
use crate::domain::value_objects::{HttpMethod, ResourcePath};
use crate::infrastructure::network::error::TransportError;
use crate::shared::config::BackendConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// REST gateway to the Wayfare backend. Joins relative resource paths onto
/// the configured base address and attaches the current bearer token to
/// every call.
pub struct RestBackend {
    client: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn AuthTokenProvider>,
}

impl RestBackend {
    pub fn new(config: &BackendConfig, tokens: Arc<dyn AuthTokenProvider>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;
        let base_url = Url::parse(&config.base_url)?;

        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    fn request_url(&self, path: &ResourcePath) -> Result<Url, AppError> {
        join_url(&self.base_url, path.as_str())
    }
}

fn join_url(base: &Url, path: &str) -> Result<Url, AppError> {
    base.join(path.trim_start_matches('/'))
        .map_err(AppError::from)
}

#[async_trait]
impl BackendTransport for RestBackend {
    async fn execute(
        &self,
        method: HttpMethod,
        path: &ResourcePath,
        payload: Option<&Value>,
    ) -> Result<Value, AppError> {
        let url = self.request_url(path)?;
        let mut builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Patch => self.client.patch(url),
            HttpMethod::Delete => self.client.delete(url),
        };

        if let Some(token) = self.tokens.bearer_token().await? {
            builder = builder.bearer_auth(token);
        }
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await.map_err(TransportError::from)?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), path = %path, "backend rejected request");
            return Err(TransportError::Status(status.as_u16()).into());
        }

        let body = response.text().await.map_err(TransportError::from)?;
        if body.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&body)
            .map_err(|e| TransportError::InvalidBody(e.to_string()).into())
    }
}
