use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Instant;

use crate::api::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub handlers: Vec<String>,
    pub dependencies: DependencyStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub database: ServiceHealth,
    pub gateways: ServiceHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    pub response_time_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check endpoint
/// Returns 200 unless the configured database is unreachable
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = Instant::now();

    let db_health = match &state.pool {
        Some(pool) => check_database(pool).await,
        None => ServiceHealth {
            status: "not_configured".to_string(),
            response_time_ms: 0,
            error: None,
        },
    };

    let gateway_health = ServiceHealth {
        status: if state.config.gateway_urls.is_empty() {
            "not_configured".to_string()
        } else {
            "configured".to_string()
        },
        response_time_ms: 0,
        error: None,
    };

    let healthy = db_health.status != "unhealthy";

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        handlers: state
            .registry
            .registered_types()
            .into_iter()
            .map(|kind| kind.to_string())
            .collect(),
        dependencies: DependencyStatus {
            database: db_health,
            gateways: gateway_health,
        },
    };

    tracing::debug!(
        status = %response.status,
        duration_ms = start.elapsed().as_millis(),
        "Health check completed"
    );

    (status_code, Json(response))
}

async fn check_database(pool: &PgPool) -> ServiceHealth {
    let start = Instant::now();

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => ServiceHealth {
            status: "healthy".to_string(),
            response_time_ms: start.elapsed().as_millis(),
            error: None,
        },
        Err(e) => ServiceHealth {
            status: "unhealthy".to_string(),
            response_time_ms: start.elapsed().as_millis(),
            error: Some(format!("Database error: {}", e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::event_handler::testing::RecordingPublisher;
    use crate::services::handler_registry::EventHandlerRegistry;
    use secrecy::Secret;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_without_database() {
        let state = AppState {
            registry: Arc::new(EventHandlerRegistry::with_defaults(Arc::new(
                RecordingPublisher::default(),
            ))),
            pool: None,
            config: Config {
                host: "127.0.0.1".to_string(),
                port: 0,
                database_url: None,
                gateway_urls: vec!["http://gw:9443".to_string()],
                gateway_secret: Secret::new("secret".to_string()),
                gateway_timeout_secs: 1,
                notification_token: None,
                cleanup_cron: "0 0 * * * *".to_string(),
            },
        };

        let (status, Json(body)) = health_check(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert_eq!(body.handlers, vec!["default".to_string()]);
        assert_eq!(body.dependencies.database.status, "not_configured");
        assert_eq!(body.dependencies.gateways.status, "configured");
    }
}
