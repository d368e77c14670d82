//! HTTP front end: serves `POST /predict` on `TENSIO_BIND_ADDR`.

use std::sync::Arc;

use anyhow::{Context, Result};

use tensio::adapters::{http, ArtifactBundle};
use tensio::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    let _guard = tensio::logging::init(&config, false)?;

    let bundle = ArtifactBundle::load(&config.artifacts)
        .with_context(|| format!("Failed to load artifacts from {:?}", config.artifacts.dir))?;
    let app = http::router(Arc::new(bundle.into_service()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "Listening on {}", http::PREDICT_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        // Without a signal handler, serve until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
