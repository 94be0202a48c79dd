//! NGX portfolio dashboard - Entry Point

use anyhow::Result;
use clap::Parser;
use folio_app::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use tracing::{info, warn};

/// Stock portfolio dashboard for the Nigerian Exchange
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = CONFIG_PATH_ENV, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Evaluate the auto-refresh gate once, print the status line and exit
    #[arg(long)]
    check_gate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, config_found) = folio_app::AppConfig::load_or_default(&args.config)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());

    folio_telemetry::init_logging(&config.telemetry.log_level)?;
    info!("Starting folio v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        info!(config_path = %args.config, "Configuration loaded");
    } else {
        warn!(config_path = %args.config, "Config file not found, using defaults");
    }

    config.validate()?;

    let app = folio_app::Application::new(config)?;

    if args.check_gate {
        let (status, decision) = app.check_gate().await;
        println!("Market status: {status}");
        println!("{}", decision.status_line());
        return Ok(());
    }

    app.run().await?;

    Ok(())
}
