//! helpdesk - ticketing backend
//!
//! Serves the ticket, project, comment and account API over HTTP.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk::{api, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::init();
    tracing::info!(
        "Starting helpdesk server on {}:{}",
        config.server.host,
        config.server.port
    );

    // Open both stores; schemas are created on first start
    let state = AppState::new(config)
        .await
        .context("failed to open the databases")?;
    tracing::info!(
        tickets = %config.database.path,
        accounts = %config.database.auth_path,
        "Application state initialized"
    );

    let app = api::app(state, &config.server.api_prefix);

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?;
    tracing::info!(
        prefix = %config.server.api_prefix,
        "Listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
