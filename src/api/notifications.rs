use axum::{
    extract::State,
    http::HeaderMap,
    middleware,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{middleware::auth::require_notification_token, state::AppState};
use crate::error::Result;
use crate::models::key_manager::KeyManagerType;

pub const NOTIFY_PATH: &str = "/internal/data/v1/notify";
pub const KEY_MANAGER_HEADER: &str = "X-WSO2-KEY-MANAGER";

#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub handled: bool,
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(NOTIFY_PATH, post(notify))
        .route_layer(middleware::from_fn_with_state(
            state,
            require_notification_token,
        ))
}

/// Receives a raw key manager notification and hands it to the matching handler
async fn notify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<NotifyResponse>> {
    let kind = match headers
        .get(KEY_MANAGER_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<KeyManagerType>()?,
        _ => KeyManagerType::Default,
    };

    let handled = state.registry.dispatch(kind, &body).await?;

    tracing::info!(key_manager_type = %kind, handled, "Notification processed");

    Ok(Json(NotifyResponse { handled }))
}
