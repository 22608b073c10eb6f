use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::key_manager::UnknownKeyManagerType;
use crate::services::{event_handler::EventHandlerError, handler_registry::RegistryError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    UnknownKeyManager(#[from] UnknownKeyManagerType),

    #[error("No event handler for key manager type {0}")]
    NoHandler(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NoHandler(kind) => AppError::NoHandler(kind.to_string()),
            RegistryError::Handler(EventHandlerError::Decode(e)) => {
                AppError::InvalidEvent(e.to_string())
            }
            RegistryError::Handler(EventHandlerError::Publish(e)) => AppError::Publish(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side failures carry gateway URLs and upstream bodies; callers
        // only get a generic message, the details stay in the log.
        let (status, message) = match self {
            AppError::UnknownKeyManager(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::NoHandler(kind) => (
                StatusCode::NOT_FOUND,
                format!("No event handler for key manager type {}", kind),
            ),
            AppError::InvalidEvent(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Publish(detail) => {
                tracing::error!(error = %detail, "Token revocation publish failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to publish token revocation".to_string(),
                )
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        };

        if status.is_client_error() {
            tracing::warn!(status = %status, error = %message, "Request rejected");
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
