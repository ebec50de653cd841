pub mod batch;
pub mod records;

use super::Commands;
use anyhow::{Context, Result};
use colored::*;
use dataverse_client::api::constants;
use dataverse_client::api::{Authorization, DataverseClient, Record};
use dataverse_client::config::Config;
use std::path::Path;

/// Authenticated client for one organisation
pub struct Session {
    pub client: DataverseClient,
    pub auth: Authorization,
}

impl Session {
    /// Build the client and acquire a token; loopback URLs skip authentication
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = DataverseClient::with_timeouts(config.resilience(), config.request_timeout(), config.connect_timeout())
            .context("Failed to create Dataverse client")?;

        if constants::is_loopback(&config.auth.url) {
            log::info!("Loopback URL configured, skipping authentication");
            let auth = Authorization::new("loopback", &config.auth.url, i64::MAX);
            return Ok(Self { client, auth });
        }

        config.require_auth()?;
        let auth = client
            .authenticate(&config.credentials(), &config.auth.url)
            .await
            .context("Failed to authenticate")?;
        anyhow::ensure!(!auth.is_expired(), "Received an already expired token");

        Ok(Self { client, auth })
    }
}

pub async fn run(command: Commands, config: &Config) -> Result<()> {
    let session = Session::connect(config).await?;

    match command {
        Commands::Retrieve(args) => records::retrieve_command(&session, args).await,
        Commands::List(args) => records::list_command(&session, args).await,
        Commands::Create(args) => records::create_command(&session, args).await,
        Commands::Update(args) => records::update_command(&session, args).await,
        Commands::Delete(args) => records::delete_command(&session, args).await,
        Commands::Batch(args) => batch::batch_command(&session, args).await,
    }
}

/// JSON object from an inline string or a file
pub fn read_record(data: Option<&str>, file: Option<&Path>) -> Result<Record> {
    let content = match (data, file) {
        (Some(data), _) => data.to_string(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?
        }
        (None, None) => anyhow::bail!("Provide the record with --data or --file"),
    };

    serde_json::from_str(&content).context("Record must be a JSON object")
}

pub fn print_record(record: &Record) -> Result<()> {
    let pretty = serde_json::to_string_pretty(record).context("Failed to format response")?;
    println!("{}", pretty.bright_white());
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".bright_green().bold(), message);
}
