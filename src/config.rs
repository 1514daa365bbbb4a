//! Configuration management for sansay-exporter
//!
//! Handles loading and validating configuration from YAML files. Per-device
//! settings (target, credentials, protocol) are not configured here: they
//! arrive with every scrape request.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Sansay API configuration
    #[serde(default)]
    pub sansay: SansayConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Exporter self-metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Device scrape endpoint path
    #[serde(default = "default_scrape_path")]
    pub scrape_path: String,

    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Upstream Sansay API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SansayConfig {
    /// Path prefix of the REST statistics resources
    #[serde(default = "default_rest_base_path")]
    pub rest_base_path: String,

    /// Path of the legacy SOAP web service
    #[serde(default = "default_soap_path")]
    pub soap_path: String,

    /// Scheme used when a scrape request has no `protocol` parameter
    #[serde(default = "default_protocol")]
    pub default_protocol: String,

    /// Upstream request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Skip TLS certificate verification for upstream calls
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

// Default value functions
fn default_port() -> u16 {
    9116
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_scrape_path() -> String {
    "/sansay".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_rest_base_path() -> String {
    "/SSConfig/webresources/stats/".to_string()
}

fn default_soap_path() -> String {
    "/SSConfig/SansayWS".to_string()
}

fn default_protocol() -> String {
    "https".to_string()
}

fn default_timeout() -> u64 {
    10000
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            metrics_path: default_metrics_path(),
            scrape_path: default_scrape_path(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for SansayConfig {
    fn default() -> Self {
        Self {
            rest_base_path: default_rest_base_path(),
            soap_path: default_soap_path(),
            default_protocol: default_protocol(),
            timeout_ms: default_timeout(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        for (name, path) in [
            ("Metrics path", &self.server.metrics_path),
            ("Scrape path", &self.server.scrape_path),
            ("REST base path", &self.sansay.rest_base_path),
            ("SOAP path", &self.sansay.soap_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "{} must start with '/'",
                    name
                )));
            }
        }

        if self.server.metrics_path == self.server.scrape_path {
            return Err(ConfigError::ValidationError(
                "Metrics path and scrape path must differ".to_string(),
            ));
        }

        for path in [&self.server.metrics_path, &self.server.scrape_path] {
            if path == "/" || path == "/health" {
                return Err(ConfigError::ValidationError(format!(
                    "Path '{}' conflicts with a built-in endpoint",
                    path
                )));
            }
        }

        if self.sansay.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Upstream timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
