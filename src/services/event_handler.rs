use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{
    key_manager::KeyManagerType,
    token_revocation::{TokenRevocationEvent, TOKEN_REVOCATION_EVENT},
};
use crate::services::revocation_publisher::{PublishError, RevocationPublisher};

#[derive(thiserror::Error, Debug)]
pub enum EventHandlerError {
    #[error("Malformed token revocation event: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to publish token revocation: {0}")]
    Publish(#[from] PublishError),
}

/// Handles notifications sent by one family of key managers
#[async_trait]
pub trait KeyManagerEventHandler: Send + Sync {
    /// Returns `Ok(true)` once the event has been dealt with, including events
    /// the handler does not act on.
    async fn handle_event(&self, event: &str) -> Result<bool, EventHandlerError>;

    fn handler_type(&self) -> KeyManagerType;
}

/// Event handler for the built-in key manager
pub struct DefaultKeyManagerEventHandler {
    publisher: Arc<dyn RevocationPublisher>,
}

impl DefaultKeyManagerEventHandler {
    pub fn new(publisher: Arc<dyn RevocationPublisher>) -> Self {
        Self { publisher }
    }

    async fn handle_token_revocation_event(&self, event: &str) -> Result<bool, EventHandlerError> {
        let (access_token, expiry_time, properties) =
            TokenRevocationEvent::from_json(event)?.into_parts();

        tracing::debug!(
            event_id = %properties.event_id,
            consumer_key = %properties.consumer_key,
            token_type = %properties.token_type,
            "Token revocation event received"
        );

        self.publisher
            .publish_revocation_events(&access_token, &expiry_time, &properties)
            .await?;

        Ok(true)
    }
}

#[async_trait]
impl KeyManagerEventHandler for DefaultKeyManagerEventHandler {
    async fn handle_event(&self, event: &str) -> Result<bool, EventHandlerError> {
        if !event.is_empty() && event.contains(TOKEN_REVOCATION_EVENT) {
            self.handle_token_revocation_event(event).await?;
        }
        Ok(true)
    }

    fn handler_type(&self) -> KeyManagerType {
        KeyManagerType::Default
    }
}
