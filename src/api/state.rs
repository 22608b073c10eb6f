use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::services::handler_registry::EventHandlerRegistry;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EventHandlerRegistry>,
    pub pool: Option<PgPool>,
    pub config: Config,
}
