use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use outreach_logging::outreach_info;

mod config;
mod shell;

use config::{AppConfig, CliOverrides};

#[derive(Parser)]
#[command(name = "outreach")]
#[command(about = "Search businesses, fix up the rows, then generate and send outreach emails")]
struct Cli {
    /// RON configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Base URL the webhook paths are joined to
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Whole-request timeout for each webhook call
    #[arg(long, value_name = "N")]
    timeout_secs: Option<u64>,
    /// Where log output goes: file, terminal or both
    #[arg(long, value_name = "DEST")]
    log: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(
        cli.config.as_deref(),
        std::env::var(config::BASE_URL_ENV).ok(),
        CliOverrides {
            base_url: cli.base_url,
            timeout_secs: cli.timeout_secs,
            log: cli.log,
        },
    )
    .context("loading configuration")?;

    outreach_logging::initialize(config.log_destination()?, log::LevelFilter::Info, &config.log_file);
    match &config.source {
        Some(path) => outreach_info!("Read configuration from {:?}", path),
        None => outreach_info!("No configuration file, using defaults"),
    }
    outreach_info!("Starting outreach with webhooks under {}", config.base_url);

    shell::run(&config).context("running the shell")
}
