//! Sansay HTTP client
//!
//! REST statistics resources with automatic fallback to the legacy SOAP web
//! service for devices that answer 404.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::soap::{SoapClient, SoapRequest};
use super::{ResourcePath, ScrapeRequest, TransportMode};
use crate::config::SansayConfig;
use crate::error::TransportError;

/// Build the shared upstream HTTP client
///
/// Sansay devices commonly present self-signed certificates, so certificate
/// validation follows `accept_invalid_certs` (on by default).
pub fn build_http_client(config: &SansayConfig) -> Result<Client, TransportError> {
    ClientBuilder::new()
        .timeout(Duration::from_millis(config.timeout_ms))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(TransportError::ClientInit)
}

/// Prefix `http://` when the URL carries no HTTP scheme
pub fn with_default_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

/// Per-scrape client for one Sansay device
#[derive(Clone)]
pub struct SansayClient {
    http: Client,
    request: Arc<ScrapeRequest>,
    rest_base_path: String,
    soap_path: String,
}

impl SansayClient {
    /// Create a client for one scrape request
    pub fn new(http: Client, config: &SansayConfig, request: ScrapeRequest) -> Self {
        Self {
            http,
            request: Arc::new(request),
            rest_base_path: config.rest_base_path.clone(),
            soap_path: config.soap_path.clone(),
        }
    }

    /// Device base URL
    pub fn target(&self) -> &str {
        &self.request.target
    }

    /// Fetch the raw XML body of one resource
    #[instrument(skip(self), fields(target = %self.request.target))]
    pub async fn fetch(&self, path: ResourcePath) -> Result<Vec<u8>, TransportError> {
        match self.request.mode {
            TransportMode::RestWithSoapFallback => self.fetch_rest(path).await,
            TransportMode::SoapOnly => self.fetch_soap(path).await,
        }
    }

    /// REST URL of a resource
    pub fn rest_url(&self, path: ResourcePath) -> Result<Url, TransportError> {
        let url = with_default_scheme(&format!(
            "{}{}{}",
            self.request.target,
            self.rest_base_path,
            path.as_str()
        ));
        Url::parse(&url).map_err(|source| TransportError::InvalidUrl { url, source })
    }

    /// SOAP endpoint URL
    pub fn soap_url(&self) -> Result<Url, TransportError> {
        let url = with_default_scheme(&format!("{}{}", self.request.target, self.soap_path));
        Url::parse(&url).map_err(|source| TransportError::InvalidUrl { url, source })
    }

    async fn fetch_rest(&self, path: ResourcePath) -> Result<Vec<u8>, TransportError> {
        let url = self.rest_url(path)?;

        debug!(url = %url, "Sending REST request");

        let response = self
            .http
            .get(url)
            .basic_auth(&self.request.username, Some(&self.request.password))
            .send()
            .await?;

        let status = response.status();
        debug!(status_code = status.as_u16(), "Received HTTP response");

        if status == StatusCode::NOT_FOUND {
            debug!(path = %path, "REST resource not found, falling back to SOAP");
            return self.fetch_soap(path).await;
        }

        if status.as_u16() > 300 {
            return Err(TransportError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(TransportError::HttpResponse)?;

        Ok(body.to_vec())
    }

    async fn fetch_soap(&self, path: ResourcePath) -> Result<Vec<u8>, TransportError> {
        let endpoint = self.soap_url()?;
        let request = SoapRequest::for_path(path, &self.request.username, &self.request.password);

        let payload = SoapClient::new(&self.http, endpoint).call(&request).await?;
        Ok(payload.into_bytes())
    }
}
