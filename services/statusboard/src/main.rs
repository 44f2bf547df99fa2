//! Status board CLI
//!
//! Command-line interface for the e-paper status board.

use std::path::PathBuf;

use clap::Parser;
use statusboard::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "statusboard")]
#[command(about = "E-paper status board for uptime monitors and error-tracker incidents")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frame output path (overrides config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render a single frame and exit
    #[arg(long)]
    once: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, output={:?}, once={}, log_level={:?}",
        args.config,
        args.output,
        args.once,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    if let Some(output) = args.output {
        config.display.output_path = output;
    }

    tracing::info!("Starting status board");
    tracing::debug!(
        "Backend project: {}, frontend project: {:?}, incident limit: {}",
        config.incidents.backend_project,
        config.incidents.frontend_project,
        config.incidents.limit
    );

    if args.once {
        let outcome = statusboard::run_once(config).await?;
        tracing::info!("Single cycle finished: {:?}", outcome);
    } else {
        statusboard::run(config).await?;
    }

    Ok(())
}
