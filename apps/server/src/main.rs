//! # Kasir Server
//!
//! HTTP back office for the registers and the payment gateway.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tracing (RUST_LOG) ─► ServerConfig::load ─► Database (migrations)     │
//! │       ─► SnapGateway ─► AppState ─► axum::serve ─► shutdown signal      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use kasir_db::Database;
use kasir_gateway::SnapGateway;
use kasir_server::config::ServerConfig;
use kasir_server::state::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Kasir server...");

    // Load configuration
    let config = ServerConfig::load(None)?;
    let settings = config.store_settings()?;
    info!(
        bind_addr = %config.server.bind_addr,
        database = ?config.database.path,
        currency = %settings.currency,
        template = %settings.invoice_template.as_str(),
        "Configuration loaded"
    );
    if config.gateway.webhook_secret.is_empty() {
        warn!("No webhook secret configured; every gateway callback will be rejected");
    }

    // Open database
    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Database::new(config.database.db_config()).await?;
    info!("Database ready");

    let gateway = SnapGateway::new(config.gateway.snap_config())?;
    let state = AppState::new(db.clone(), Arc::new(gateway), settings, &config.gateway)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, kasir_server::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
