use secrecy::ExposeSecret;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keymanager_notify::api::{self, state::AppState};
use keymanager_notify::config::Config;
use keymanager_notify::db;
use keymanager_notify::jobs::revoked_token_cleaner;
use keymanager_notify::services::{
    gateway_notifier::GatewayNotifier, handler_registry::EventHandlerRegistry,
    revocation_publisher::RevocationRequestPublisher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keymanager_notify=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting key manager notification service...");

    let config = Config::from_env()?;
    tracing::info!(
        gateways = config.gateway_urls.len(),
        database = config.database_url.is_some(),
        "Configuration loaded successfully"
    );

    let pool = match &config.database_url {
        Some(url) => Some(db::connect(url).await?),
        None => {
            tracing::warn!("No database configured, revoked tokens will not be persisted");
            None
        }
    };

    if config.gateway_urls.is_empty() {
        tracing::warn!("No gateways configured, revocations will not be forwarded");
    }

    let notifier = GatewayNotifier::new(
        &config.gateway_urls,
        config.gateway_secret.expose_secret(),
        Duration::from_secs(config.gateway_timeout_secs),
    )?;
    let publisher = Arc::new(RevocationRequestPublisher::new(pool.clone(), notifier));
    let registry = Arc::new(EventHandlerRegistry::with_defaults(publisher));

    let _cleanup_scheduler = match &pool {
        Some(pool) => Some(
            revoked_token_cleaner::start_cleanup_job(pool.clone(), &config.cleanup_cron).await?,
        ),
        None => None,
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = AppState {
        registry,
        pool,
        config,
    };

    let app = api::router(state).layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, cleaning up...");
}
