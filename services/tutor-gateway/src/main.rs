//! Tutor Gateway
//!
//! Single-binary Rust service that:
//! 1. Loads a pool of generative-service API keys
//! 2. Serves the learning features over JSON HTTP endpoints
//! 3. Runs every upstream call with round-robin key rotation on rate limits

mod api;
mod config;
mod error;
mod features;
mod metrics;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use key_pool::{JitteredDelay, RetryExecutor};

use crate::api::AppState;
use crate::config::Config;
use crate::features::Generator;
use crate::metrics::ServiceMetrics;

/// How long in-flight requests may run after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting tutor-gateway");

    // Installed before the key pool exists so its counters are captured.
    let prometheus_handle = metrics::install_recorder();

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let pool = config.key_pool();
    if pool.is_empty() {
        warn!(
            env = config::KEYS_ENV_VAR,
            "no API keys configured, upstream calls will be sent without a key"
        );
    }

    info!(
        listen_addr = %config.server.listen_addr,
        base_url = %config.genai.base_url,
        model = %config.genai.model,
        key_source = config.genai.key_source.label(),
        keys = pool.len(),
        masked_keys = ?pool.masked_keys(),
        retry_budget = pool.retry_budget(),
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!("tutor-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    let client = genai::Client::new(
        http,
        config.genai.base_url.clone(),
        Duration::from_secs(config.genai.timeout_secs),
    );
    let executor = RetryExecutor::new(pool, Arc::new(JitteredDelay));

    let service_metrics = ServiceMetrics::new();
    let app_state = AppState {
        generator: Generator::new(client, executor, config.genai.model.clone()),
        metrics: service_metrics.clone(),
        prometheus: prometheus_handle,
    };

    let app = api::build_router(app_state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timer starts at signal receipt, not at server start.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => {
            info!("all in-flight requests drained");
        }
        Ok(Ok(Err(e))) => {
            error!(error = %e, "server error during shutdown");
        }
        Ok(Err(e)) => {
            error!(error = %e, "server task panicked");
        }
        Err(_) => {
            warn!(
                served = service_metrics.requests_total.load(Ordering::Relaxed),
                drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "drain timeout exceeded, forcing shutdown"
            );
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
