use super::{Session, print_success};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use dataverse_client::api::{BatchOperation, BatchRequestParams, Record};
use reqwest::Method;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct BatchArgs {
    /// JSON file with an array of {"verb", "table", "payload"} entries
    pub file: PathBuf,
    /// Fixed boundary discriminator instead of a random one
    #[arg(long)]
    pub seed: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BatchEntry {
    #[serde(default = "default_verb")]
    verb: String,
    table: String,
    payload: Record,
}

fn default_verb() -> String {
    "POST".to_string()
}

pub async fn batch_command(session: &Session, args: BatchArgs) -> Result<()> {
    let content =
        std::fs::read_to_string(&args.file).with_context(|| format!("Failed to read {:?}", args.file))?;
    let operations = parse_operations(&content)?;
    let count = operations.len();

    let mut params = BatchRequestParams::new(&session.auth, operations);
    if let Some(seed) = args.seed {
        params = params.with_seed(seed);
    }

    let outcome = session.client.batch(params).await?;

    if outcome.is_fake {
        print_success(&format!("Loopback batch of {} operations accepted", count));
        return Ok(());
    }

    let failures: Vec<_> = outcome.failures().collect();
    for item in &failures {
        println!(
            "  {} Content-ID {}: {}",
            "✗".bright_red().bold(),
            item.content_id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
            item.error_message().unwrap_or_default()
        );
    }

    print_success(&format!(
        "Batch of {} operations finished with HTTP {} after {} attempt(s), {} failed",
        count,
        outcome.status,
        outcome.attempts,
        failures.len()
    ));
    Ok(())
}

fn parse_operations(content: &str) -> Result<Vec<BatchOperation>> {
    let entries: Vec<BatchEntry> = serde_json::from_str(content).context("Batch file must be a JSON array")?;

    entries
        .into_iter()
        .map(|entry| -> Result<BatchOperation> {
            let verb = Method::from_bytes(entry.verb.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("Invalid verb '{}'", entry.verb))?;
            Ok(BatchOperation::new(verb, entry.table, entry.payload))
        })
        .collect()
}
