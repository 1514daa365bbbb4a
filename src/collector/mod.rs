//! Sansay API collection module
//!
//! Fetches statistics from a Sansay SBC over its REST interface, falling back
//! to the legacy SOAP web service, and decodes the XML payloads.
//!
//! # Example
//!
//! ```ignore
//! use sansay_exporter::collector::{build_http_client, ResourcePath, SansayClient, ScrapeRequest, TransportMode};
//!
//! let http = build_http_client(&config.sansay)?;
//! let request = ScrapeRequest::new("https", "10.0.0.1", "admin", "secret", TransportMode::RestWithSoapFallback);
//! let client = SansayClient::new(http, &config.sansay, request);
//! let body = client.fetch(ResourcePath::RealtimeStats).await?;
//! ```

mod client;
mod parser;
mod soap;

use std::fmt;

pub use client::{build_http_client, with_default_scheme, SansayClient};
pub use parser::{
    decode, Database, Decoded, Field, MediaServerRecord, ResourceConfigRecord, ResponseShape,
    Row, Table, TabularDump,
};
pub use soap::{parse_soap_response, SoapRequest, SANSAY_NAMESPACE};

/// Upstream resources fetched on every scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourcePath {
    /// Real-time trunk and system statistics
    RealtimeStats,
    /// Windowed per-trunk ingress/egress statistics
    ResourceStats,
    /// Media server status
    MediaServerStats,
    /// Trunk group configuration download
    ResourceConfigDownload,
}

impl ResourcePath {
    /// Every resource, in launch order
    pub const ALL: [ResourcePath; 4] = [
        ResourcePath::RealtimeStats,
        ResourcePath::ResourceStats,
        ResourcePath::MediaServerStats,
        ResourcePath::ResourceConfigDownload,
    ];

    /// Path relative to the REST base path
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourcePath::RealtimeStats => "stats/realtime",
            ResourcePath::ResourceStats => "stats/resource",
            ResourcePath::MediaServerStats => "stats/media_server",
            ResourcePath::ResourceConfigDownload => "download/resource",
        }
    }

    /// Legacy stat name: the last path segment
    pub fn stat_name(&self) -> &'static str {
        let path = self.as_str();
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Whether the SOAP fallback must use the download operation
    pub fn is_download(&self) -> bool {
        self.as_str().ends_with("download/resource")
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport selection for one scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// REST first; a 404 retries the same resource over SOAP
    RestWithSoapFallback,
    /// Legacy SOAP web service only
    SoapOnly,
}

impl TransportMode {
    /// Select the mode from the `api` query parameter
    pub fn from_api(api: Option<&str>) -> Self {
        match api {
            Some(api) if api.eq_ignore_ascii_case("soap") => TransportMode::SoapOnly,
            _ => TransportMode::RestWithSoapFallback,
        }
    }
}

/// Parameters of one inbound scrape request
#[derive(Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    /// Device base URL, `<protocol>://<host[:port]>`
    pub target: String,
    /// Transport selection
    pub mode: TransportMode,
    /// API username
    pub username: String,
    /// API password
    pub password: String,
}

impl ScrapeRequest {
    /// Build a request for `host` reached over `protocol`
    pub fn new(
        protocol: &str,
        host: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        mode: TransportMode,
    ) -> Self {
        Self {
            target: format!("{}://{}", protocol, host),
            mode,
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ScrapeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeRequest")
            .field("target", &self.target)
            .field("mode", &self.mode)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
