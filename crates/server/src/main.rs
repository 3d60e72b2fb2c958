mod api;
mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use whispercart_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use whispercart_core::config::LogFormat::*;

    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging comes up before bootstrap so config problems are reported through it.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);

    let router = api::router(app.agent_runtime.clone())
        .merge(health::router(app.agent_runtime.clone()));
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        address = %address,
        remote_model = app.agent_runtime.remote_model().unwrap_or("none"),
        "whispercart-server listening"
    );

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut drain_rx = stop_tx.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                "whispercart-server stopping"
            );
        }
        let _ = stop_tx.send(true);
    });

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        let _ = stop_rx.wait_for(|stopped| *stopped).await;
    });

    tokio::select! {
        result = server => result.context("server terminated with an error")?,
        _ = async {
            let _ = drain_rx.wait_for(|stopped| *stopped).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "in-flight requests did not finish before the shutdown grace period"
            );
        }
    }

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "whispercart-server stopped"
    );
    Ok(())
}
