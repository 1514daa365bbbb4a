//! HTTP server module
//!
//! Provides the Axum-based HTTP server for the scrape and self-metrics
//! endpoints.

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::collector::build_http_client;
use crate::config::Config;
use crate::metrics::ExporterMetrics;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Upstream HTTP client, shared by every scrape
    pub http: reqwest::Client,
    /// Exporter self-metrics
    pub metrics: Arc<ExporterMetrics>,
}

impl AppState {
    /// Build the state, including the upstream HTTP client
    pub fn new(config: Config, metrics: Arc<ExporterMetrics>) -> Result<Self> {
        let http = build_http_client(&config.sansay)?;
        Ok(Self {
            config: Arc::new(config),
            http,
            metrics,
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let metrics_path = state.config.server.metrics_path.clone();
    let scrape_path = state.config.server.scrape_path.clone();

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(&metrics_path, get(handlers::metrics))
        .route(&scrape_path, get(handlers::scrape))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
///
/// # Errors
/// Returns an error if the server fails to start
pub async fn run(config: Config, metrics: Arc<ExporterMetrics>) -> Result<()> {
    let bind_address = config.server.bind_address.clone();
    let port = config.server.port;
    let scrape_path = config.server.scrape_path.clone();

    let app = router(AppState::new(config, metrics)?);

    // Handle "localhost" specially, otherwise parse as IP address
    let bind_addr: std::net::IpAddr = if bind_address == "localhost" {
        std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST)
    } else {
        bind_address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind_address '{}': {}. Use an IP address (e.g., '0.0.0.0', '127.0.0.1') or 'localhost'.", bind_address, e))?
    };
    let addr = SocketAddr::from((bind_addr, port));
    info!(address = %addr, scrape_path = %scrape_path, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
