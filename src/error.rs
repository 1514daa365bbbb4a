//! Error types for sansay-exporter
//!
//! Each layer of the scrape pipeline owns its error enum. None of them abort a
//! scrape: transport and decode failures are terminal for one resource path,
//! emit failures for one field, and all of them end up as `sansay_error`
//! markers in the scrape output.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Upstream transport errors (REST or SOAP)
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to build the HTTP client
    #[error("Failed to initialize HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    /// Target URL could not be parsed
    #[error("Could not parse target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// Failed to read the response body
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Invalid response from server: {0}")]
    HttpStatus(u16),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// SOAP endpoint returned a fault
    #[error("SOAP fault {code}: {message}")]
    SoapFault { code: String, message: String },

    /// SOAP response did not carry the expected payload
    #[error("Malformed SOAP response: {0}")]
    SoapResponse(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            TransportError::HttpRequest(err)
        } else {
            TransportError::HttpResponse(err)
        }
    }
}

/// XML decoding errors
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Document root does not match the shape expected for the path
    #[error("Error parsing XML for {path}: expected element <{expected}> but have <{found}>")]
    UnexpectedRoot {
        path: String,
        expected: &'static str,
        found: String,
    },

    /// Document has no root element at all
    #[error("Error parsing XML for {path}: document is empty")]
    Empty { path: String },

    /// Structural mismatch or malformed XML
    #[error("Error parsing XML for {path}: {message}")]
    Xml { path: String, message: String },
}

/// Per-field emission errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    /// Field value is not a number
    #[error("Invalid value '{value}' for {metric}: {reason}")]
    InvalidNumber {
        metric: String,
        value: String,
        reason: String,
    },

    /// Derived name is not a valid Prometheus metric name
    #[error("Invalid metric name '{0}'")]
    InvalidMetricName(String),

    /// Name and label set already emitted in this scrape
    #[error("Duplicate series {0}")]
    DuplicateSeries(String),
}

/// Failure of one resource path during a scrape
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Transport failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Decode failure
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Fetch task did not run to completion
    #[error("Scrape task for {path} failed: {message}")]
    Task { path: String, message: String },
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Scrape request without a target
    #[error("'target' parameter must be specified")]
    MissingTarget,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MissingTarget => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        tracing::debug!(status = %status, error = %message, "Request rejected");

        (status, message).into_response()
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
