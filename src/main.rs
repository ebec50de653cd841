use anyhow::Result;
use clap::Parser;
use log::{debug, info};

mod cli;

use cli::Cli;
use dataverse_client::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if cli.verbose {
        config.client.verbose = true;
    }

    let mut logger = env_logger::Builder::from_default_env();
    if config.client.verbose && std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    info!("Starting dataverse {}", env!("CARGO_PKG_VERSION"));
    debug!("Organisation URL: {}", config.auth.url);

    cli::commands::run(cli.command, &config).await
}
