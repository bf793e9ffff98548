use crate::application::ports::ReachabilityProbe;
use crate::domain::entities::sync::ConnectivityState;
use crate::domain::value_objects::NetworkType;
use crate::shared::config::BackendConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Confirms reachability with a real round-trip to the configured probe
/// endpoint. A present link without upstream connectivity therefore reads
/// as offline. The link classification the mobile OS would report is not
/// observable from here, so an online reading carries `Unknown`.
pub struct HttpReachabilityProbe {
    client: reqwest::Client,
    probe_url: String,
}

impl HttpReachabilityProbe {
    pub fn new(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout))
            .build()
            .unwrap_or_default();

        Self {
            client,
            probe_url: config.probe_url.clone(),
        }
    }
}

#[async_trait]
impl ReachabilityProbe for HttpReachabilityProbe {
    async fn probe(&self) -> ConnectivityState {
        match self.client.head(&self.probe_url).send().await {
            Ok(response) if response.status().is_success() => {
                ConnectivityState::online(NetworkType::Unknown)
            }
            Ok(response) => {
                tracing::debug!(
                    status = response.status().as_u16(),
                    "reachability probe answered with an error status"
                );
                ConnectivityState::offline()
            }
            Err(e) => {
                tracing::debug!(error = %e, "reachability probe failed");
                ConnectivityState::offline()
            }
        }
    }
}
