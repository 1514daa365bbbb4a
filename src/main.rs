//! sansay-exporter - Prometheus exporter for Sansay SBCs
//!
//! This binary serves a multi-target scrape endpoint: every request names the
//! device to collect in its `target` query parameter.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use sansay_exporter::cli::{Cli, LogFormat, OutputFormat};
use sansay_exporter::config::Config;
use sansay_exporter::metrics::ExporterMetrics;
use sansay_exporter::server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    sansay_exporter::init_logging(
        &cli.log_level.to_string(),
        cli.log_format == LogFormat::Json,
    )?;

    let mut config = Config::load_or_default(&cli.config)?;
    cli.apply(&mut config);
    config.validate()?;

    if cli.validate {
        print_validation(&config, cli.output_format)?;
        return Ok(());
    }

    if cli.dry_run {
        print_config(&config, cli.output_format)?;
        return Ok(());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting sansay-exporter"
    );

    // Self-metrics live for the whole process
    let metrics = Arc::new(ExporterMetrics::new());

    server::run(config, metrics).await?;

    Ok(())
}

fn print_validation(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("Configuration is valid"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "valid": true, "config": config }))?
        ),
        OutputFormat::Yaml => {
            println!("valid: true");
            print!("{}", serde_yaml::to_string(config)?);
        }
    }
    Ok(())
}

fn print_config(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Configuration parsed successfully");
            println!("  listen:           {}:{}", config.server.bind_address, config.server.port);
            println!("  metrics path:     {}", config.server.metrics_path);
            println!("  scrape path:      {}", config.server.scrape_path);
            println!("  REST base path:   {}", config.sansay.rest_base_path);
            println!("  SOAP path:        {}", config.sansay.soap_path);
            println!("  default protocol: {}", config.sansay.default_protocol);
            println!("  timeout:          {}ms", config.sansay.timeout_ms);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(config)?),
    }
    Ok(())
}
