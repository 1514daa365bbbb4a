//! CLI argument parsing for sansay-exporter
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: config.yaml, env: SANSAY_CONFIG)
//! - `--port` / `-p`: Server port (overrides config file, env: SANSAY_PORT)
//! - `--bind-address`: Server bind address (env: SANSAY_BIND_ADDRESS)
//! - `--timeout`: Upstream HTTP timeout in milliseconds (env: SANSAY_TIMEOUT)
//! - `--validate`: Validate configuration without starting server
//! - `--dry-run`: Print the effective configuration and exit
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: SANSAY_LOG_LEVEL)
//! - `--log-format`: Log output format (text/json, env: SANSAY_LOG_FORMAT)
//! - `--output-format`: Output format for validate/dry-run (text/json/yaml)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

/// sansay-exporter - Prometheus exporter for Sansay session border controllers
///
/// Scrapes the Sansay REST API (falling back to the SOAP web service) of the
/// device named in each scrape request's `target` parameter.
#[derive(Parser, Debug)]
#[command(name = "sansay-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.yaml",
        env = "SANSAY_CONFIG"
    )]
    pub config: PathBuf,

    /// Server port (overrides config file)
    #[arg(short, long, value_name = "PORT", env = "SANSAY_PORT")]
    pub port: Option<u16>,

    /// Server bind address (overrides config file)
    /// Supported values: IP addresses (0.0.0.0, 127.0.0.1, ::1) or "localhost"
    #[arg(long, value_name = "ADDRESS", env = "SANSAY_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Upstream HTTP timeout in milliseconds (overrides config file)
    #[arg(long, value_name = "MS", env = "SANSAY_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Validate configuration without starting server
    #[arg(long)]
    pub validate: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "SANSAY_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "SANSAY_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Output format for --validate and --dry-run
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref bind_address) = self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(timeout) = self.timeout {
            config.sansay.timeout_ms = timeout;
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log output format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Output format options for validate and dry-run modes
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["sansay-exporter"]);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert_eq!(cli.port, None);
        assert_eq!(cli.bind_address, None);
        assert_eq!(cli.timeout, None);
        assert!(!cli.validate);
        assert!(!cli.dry_run);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_with_options() {
        let cli = Cli::parse_from([
            "sansay-exporter",
            "-c",
            "custom.yaml",
            "-p",
            "9200",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "--validate",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.yaml"));
        assert_eq!(cli.port, Some(9200));
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.validate);
    }

    #[test]
    fn test_cli_dry_run() {
        let cli = Cli::parse_from(["sansay-exporter", "--dry-run", "--output-format", "yaml"]);
        assert!(cli.dry_run);
        assert_eq!(cli.output_format, OutputFormat::Yaml);
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::parse_from([
            "sansay-exporter",
            "--port",
            "9300",
            "--bind-address",
            "127.0.0.1",
            "--timeout",
            "3000",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.server.port, 9300);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.sansay.timeout_ms, 3000);
        assert_eq!(config.server.scrape_path, "/sansay");
    }

    #[test]
    fn test_apply_without_overrides_keeps_config() {
        let cli = Cli::parse_from(["sansay-exporter"]);
        let mut config = Config::default();
        config.server.port = 9999;
        cli.apply(&mut config);
        assert_eq!(config.server.port, 9999);
    }
}
