use super::{Session, print_record, print_success, read_record};
use anyhow::Result;
use clap::Args;
use dataverse_client::api::{
    Condition, CreateUpdateRequest, DeleteRequest, Filter, RetrieveMultipleRequest, RetrieveRequest,
};
use std::path::PathBuf;

#[derive(Args)]
pub struct RetrieveArgs {
    /// Table (entity set) name, e.g. contacts
    pub table: String,
    /// Record id
    pub id: String,
    /// Comma separated columns to select
    #[arg(short, long)]
    pub columns: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Table (entity set) name, e.g. contacts
    pub table: String,
    /// Comma separated columns to select
    #[arg(short, long)]
    pub columns: Option<String>,
    /// Condition as "key operator value" or a single expression; repeatable
    #[arg(short = 'w', long = "where")]
    pub conditions: Vec<String>,
    /// Join conditions with `or` instead of `and`
    #[arg(long)]
    pub any: bool,
    /// Preformatted $filter, used when no --where is given
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Table (entity set) name, e.g. contacts
    pub table: String,
    /// Record as inline JSON
    #[arg(short, long)]
    pub data: Option<String>,
    /// Record as a JSON file
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Table (entity set) name, e.g. contacts
    pub table: String,
    /// Record id
    pub id: String,
    /// Changed fields as inline JSON
    #[arg(short, long)]
    pub data: Option<String>,
    /// Changed fields as a JSON file
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Table (entity set) name, e.g. contacts
    pub table: String,
    /// Record id
    pub id: String,
}

pub async fn retrieve_command(session: &Session, args: RetrieveArgs) -> Result<()> {
    let request = RetrieveRequest::new(&session.auth, args.table, args.id)
        .columns_string(args.columns.unwrap_or_default());

    let record = session.client.retrieve(request).await?;
    print_record(&record)
}

pub async fn list_command(session: &Session, args: ListArgs) -> Result<()> {
    let request = RetrieveMultipleRequest::new(&session.auth, &args.table)
        .columns_string(args.columns.clone().unwrap_or_default())
        .filter(filter_from_conditions(&args.conditions, args.any))
        .filter_string(args.filter.clone().unwrap_or_default());

    let records = session.client.retrieve_multiple(request).await?;
    print_record(&records)
}

pub async fn create_command(session: &Session, args: CreateArgs) -> Result<()> {
    let row = read_record(args.data.as_deref(), args.file.as_deref())?;
    let table = args.table;

    let id = session
        .client
        .create_update(CreateUpdateRequest::create(&session.auth, &table, row))
        .await?;

    print_success(&format!("Created {} record {}", table, id));
    Ok(())
}

pub async fn update_command(session: &Session, args: UpdateArgs) -> Result<()> {
    let row = read_record(args.data.as_deref(), args.file.as_deref())?;
    let table = args.table;

    let id = session
        .client
        .create_update(CreateUpdateRequest::update(&session.auth, &table, args.id, row))
        .await?;

    print_success(&format!("Updated {} record {}", table, id));
    Ok(())
}

pub async fn delete_command(session: &Session, args: DeleteArgs) -> Result<()> {
    session
        .client
        .delete(DeleteRequest::new(&session.auth, &args.table, &args.id))
        .await?;

    print_success(&format!("Deleted {} record {}", args.table, args.id));
    Ok(())
}

/// Unset filter when there are no conditions
fn filter_from_conditions(conditions: &[String], any: bool) -> Filter {
    if conditions.is_empty() {
        return Filter::default();
    }

    let filter = if any { Filter::or() } else { Filter::and() };
    filter.with_conditions(conditions.iter().map(|c| parse_condition(c)))
}

/// "key operator value" or, without spaces, a raw expression
fn parse_condition(text: &str) -> Condition {
    let mut parts = text.trim().splitn(3, ' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(operator), Some(value)) => Condition::new(key, operator, value.trim()),
        _ => Condition::raw(text.trim()),
    }
}
