//! Sketchpilot server binary
//!
//! Loads configuration, initializes logging, and runs the HTTP server
//! that fronts the sketch-editing pipeline.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sketchpilot_api::ApiServer;
use sketchpilot_core::AppConfig;

/// AI pair-editor backend for p5.js sketches
#[derive(Debug, Parser)]
#[command(name = "sketchpilot", version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "sketchpilot.toml")]
    config: PathBuf,

    /// Override the listen port from the config file
    #[arg(long)]
    port: Option<u16>,

    /// Print the effective configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.check_config {
        // Credentials never live in the config, so this is safe to print
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    info!(
        config = %args.config.display(),
        port = config.server.port,
        "Sketchpilot starting"
    );

    ApiServer::new(config).start().await
}
