mod config;
mod error;
mod handlers;
mod routes;
mod state;
mod translate;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("translate_gateway=debug,tower_http=debug")),
        )
        .init();

    let (config, loaded_path) = Config::from_env()?;
    match loaded_path {
        Some(path) => info!("Loaded configuration from: {}", path),
        None => info!("No configuration file found, using defaults"),
    }

    let app_state = AppState::new(config)?;
    info!(
        "Fallback order: {}",
        app_state.gateway.backend_names().join(" -> ")
    );

    let host = app_state.config.server.host.clone();
    let port = app_state.config.server.port;
    let app = routes::build_app(app_state);

    info!("Starting server on {}:{}", host, port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
