//! `filecrypt` — passphrase file encryption service entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise logging (and OTLP span export when configured).
//! 3. Create the upload and processed directories.
//! 4. Build the Axum router and serve until Ctrl-C.

mod config;
mod crypto;
mod server;
mod storage;
mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use config::Config;
use server::{middleware::Limits, state::AppState};
use storage::FsStore;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        default_format = %cfg.default_format,
        "filecrypt starting"
    );
    if !cfg.default_format.is_authenticated() {
        warn!("default envelope format is unauthenticated; tampering will not be detected");
    }

    // -----------------------------------------------------------------------
    // 3. Storage
    // -----------------------------------------------------------------------
    let store = FsStore::init(&cfg.upload_dir, &cfg.processed_dir)
        .context("failed to prepare storage directories")?;

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(Arc::new(store), cfg.default_format);
    let router = server::router::build(state, Limits::from_config(&cfg));

    let addr = cfg.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    opentelemetry::global::shutdown_tracer_provider();
    info!("filecrypt stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
