use crate::application::ports::AuthTokenProvider;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds whatever bearer token the host shell last injected. The shell owns
/// acquisition, refresh, and secure storage; a queued request replayed later
/// simply picks up the token current at that moment.
#[derive(Default, Clone)]
pub struct SharedTokenProvider {
    token: Arc<RwLock<Option<String>>>,
}

impl SharedTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_token(&self, token: String) {
        *self.token.write().await = Some(token);
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }
}

#[async_trait]
impl AuthTokenProvider for SharedTokenProvider {
    async fn bearer_token(&self) -> Result<Option<String>, AppError> {
        Ok(self.token.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_updates_are_visible_to_later_reads() {
        let provider = SharedTokenProvider::new();
        assert!(provider.bearer_token().await.unwrap().is_none());

        provider.set_token("abc123".to_string()).await;
        assert_eq!(
            provider.bearer_token().await.unwrap().as_deref(),
            Some("abc123")
        );

        provider.clear_token().await;
        assert!(provider.bearer_token().await.unwrap().is_none());
    }
}
