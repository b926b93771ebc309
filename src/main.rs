//! Clinic Assistant server
//!
//! Serves the WhatsApp webhook and the manual prescription endpoint, and
//! runs the reconciliation sweep for committed actions in the background.

use clinic_assistant::bootstrap::AppContext;
use clinic_assistant::config::AppConfig;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    config.validate()?;

    let addr = config.server.socket_addr()?;
    let context = AppContext::init(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = context.spawn_reconciler(shutdown_rx);

    let app = context.router();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        backend = ?config.database.backend,
        messaging = config.messaging.enabled,
        "Clinic assistant listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(e) = reconciler.await {
        tracing::error!(error = %e, "Reconciliation task ended abnormally");
    }
    context.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
