//! HTTP request handlers
//!
//! Contains handlers for all HTTP endpoints.

use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::AppState;
use crate::collector::{SansayClient, ScrapeRequest, TransportMode};
use crate::error::{AppError, AppResult};
use crate::scraper::Scraper;
use crate::transformer::PrometheusFormatter;

/// Prometheus text exposition content type
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Health status
    status: String,
    /// Application version
    version: String,
}

/// Query parameters of a scrape request
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeParams {
    /// Device address, `host[:port]`
    pub target: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// `http` or `https`; the configured default when absent
    pub protocol: Option<String>,
    /// `soap` forces the legacy web service
    pub api: Option<String>,
}

/// Root endpoint - scrape form
pub async fn root(State(state): State<AppState>) -> Html<String> {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Sansay Exporter</title>
    <style>
    label {{ display: inline-block; width: 75px; }}
    form label, form input {{ margin: 10px; }}
    </style>
</head>
<body>
    <h1>Sansay Exporter</h1>
    <p>Version: {version}</p>
    <form action="{scrape}">
        <label>Target:</label> <input type="text" name="target" placeholder="X.X.X.X" value="1.2.3.4"><br>
        <input type="submit" value="Submit">
    </form>
    <ul>
        <li><a href="/health">Health Check</a></li>
        <li><a href="{metrics}">Metrics</a></li>
    </ul>
</body>
</html>"#,
        version = env!("CARGO_PKG_VERSION"),
        scrape = state.config.server.scrape_path,
        metrics = state.config.server.metrics_path,
    );
    Html(html)
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Exporter self-metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.format_prometheus(),
    )
}

/// Scrape endpoint - collects one Sansay device and returns Prometheus format
#[instrument(skip_all, fields(target = tracing::field::Empty), name = "scrape_handler")]
pub async fn scrape(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> AppResult<impl IntoResponse> {
    let target = match params.target.as_deref() {
        Some(target) if !target.is_empty() => target,
        _ => {
            state.metrics.request_errors_total.inc();
            return Err(AppError::MissingTarget);
        }
    };
    tracing::Span::current().record("target", target);

    let protocol = params
        .protocol
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(state.config.sansay.default_protocol.as_str());
    let mode = TransportMode::from_api(params.api.as_deref());

    debug!(protocol = %protocol, mode = ?mode, "Starting scrape");
    let start = Instant::now();

    let request = ScrapeRequest::new(
        protocol,
        target,
        params.username.as_str(),
        params.password.as_str(),
        mode,
    );
    let client = SansayClient::new(state.http.clone(), &state.config.sansay, request);
    let sink = Scraper::new(client).scrape().await;

    let output = PrometheusFormatter::new().format(&sink.into_metrics());

    let duration = start.elapsed().as_secs_f64();
    state.metrics.collection_duration_seconds.observe(duration);
    debug!(duration_seconds = duration, "Finished scrape");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        output,
    ))
}
