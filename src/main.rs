//! Firmware Update Server
//!
//! Serves firmware images to devices doing over-the-air updates, skipping
//! the download when the device already runs the stored image, and accepts
//! new images from release tooling authenticated by a per-app key.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod firmware;
mod routes;
mod state;

use config::Config;
use db::SqliteFirmwareRepository;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "firmware_update_server=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting Firmware Update Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Max firmware size: {} bytes", config.firmware.max_size);

    run(config).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn run(config: Config) -> error::Result<()> {
    // Initialize database
    let db_pool = db::create_pool(&config.database.url).await?;
    tracing::info!("Database initialized at {}", config.database.url);

    let repository = SqliteFirmwareRepository::new(db_pool.clone());
    seed_apps(&repository, &config).await;

    // Create application state
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| error::AppError::Config(format!("Invalid server address: {}", e)))?;
    let app_state = AppState::new(config, Arc::new(repository));

    // Build router
    let app = routes::router(app_state);

    // Start server with graceful shutdown
    tracing::info!("Firmware Update Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    Ok(())
}

/// Register the apps listed in the configuration
async fn seed_apps(repository: &SqliteFirmwareRepository, config: &Config) {
    for app in &config.firmware.apps {
        match repository.register_app(app).await {
            Ok(true) => tracing::info!(name = %app.name, "Registered app"),
            Ok(false) => tracing::debug!(name = %app.name, "App already registered"),
            Err(e) => tracing::warn!(name = %app.name, "Failed to register app: {}", e),
        }
    }

    match repository.list_apps().await {
        Ok(apps) => tracing::info!("{} apps registered", apps.len()),
        Err(e) => tracing::warn!("Failed to list registered apps: {}", e),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
