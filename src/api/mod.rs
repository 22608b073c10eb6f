// API module - HTTP endpoints

pub mod health;
pub mod middleware;
pub mod notifications;
pub mod state;

use axum::{routing::get, Router};

use state::AppState;

/// Builds the service router without transport layers
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(notifications::router(state.clone()))
        .with_state(state)
}
