use crate::domain::entities::sync::ConnectivityState;
use async_trait::async_trait;

/// Answers whether the public internet is actually reachable right now.
/// Implementations must not fail: detection problems degrade to offline.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> ConnectivityState;
}
