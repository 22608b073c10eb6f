use std::collections::HashMap;
use std::sync::Arc;

use crate::models::key_manager::KeyManagerType;
use crate::services::event_handler::{
    DefaultKeyManagerEventHandler, EventHandlerError, KeyManagerEventHandler,
};
use crate::services::revocation_publisher::RevocationPublisher;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("No event handler registered for key manager type {0}")]
    NoHandler(KeyManagerType),

    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

/// Routes key manager notifications to the handler registered for their type
#[derive(Default, Clone)]
pub struct EventHandlerRegistry {
    handlers: HashMap<KeyManagerType, Arc<dyn KeyManagerEventHandler>>,
}

impl EventHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handlers shipped by this service
    pub fn with_defaults(publisher: Arc<dyn RevocationPublisher>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DefaultKeyManagerEventHandler::new(publisher)));
        registry
    }

    /// Registers `handler` under its own type, replacing any earlier handler
    pub fn register(&mut self, handler: Arc<dyn KeyManagerEventHandler>) {
        let kind = handler.handler_type();
        if self.handlers.insert(kind, handler).is_some() {
            tracing::warn!(key_manager_type = %kind, "Replaced existing event handler");
        } else {
            tracing::debug!(key_manager_type = %kind, "Registered event handler");
        }
    }

    pub fn get(&self, kind: KeyManagerType) -> Option<Arc<dyn KeyManagerEventHandler>> {
        self.handlers.get(&kind).cloned()
    }

    pub fn registered_types(&self) -> Vec<KeyManagerType> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.as_str());
        kinds
    }

    #[tracing::instrument(skip(self, event), fields(event_len = event.len()))]
    pub async fn dispatch(&self, kind: KeyManagerType, event: &str) -> Result<bool, RegistryError> {
        let handler = self.get(kind).ok_or(RegistryError::NoHandler(kind))?;
        Ok(handler.handle_event(event).await?)
    }
}
