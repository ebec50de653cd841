use super::commands::batch::BatchArgs;
use super::commands::records::{CreateArgs, DeleteArgs, ListArgs, RetrieveArgs, UpdateArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dataverse")]
#[command(about = "A CLI tool for the Microsoft Dataverse Web API")]
#[command(version)]
pub struct Cli {
    /// Log URL, status and body of failed requests
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Retrieve a single record by id
    Retrieve(RetrieveArgs),
    /// List the records of a table, optionally filtered
    List(ListArgs),
    /// Create a record from a JSON object
    Create(CreateArgs),
    /// Update an existing record from a JSON object
    Update(UpdateArgs),
    /// Delete a record by id
    Delete(DeleteArgs),
    /// Submit several writes as one $batch changeset
    Batch(BatchArgs),
}
