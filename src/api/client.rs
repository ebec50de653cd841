use super::auth::{self, ClientCredentials};
use super::completion::{BatchOutcome, RequestCompletion};
use super::constants;
use super::error::{ApiError, Result};
use super::models::{Authorization, Record, record_id};
use super::operations::{BatchOperation, BatchRequestBuilder};
use super::query::{Filter, Query};
use super::resilience::ResilienceConfig;
use super::transport::{ReqwestTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Retrieve one record by id
#[derive(Debug, Clone)]
pub struct RetrieveRequest<'a> {
    pub auth: &'a Authorization,
    pub table: String,
    pub id: String,
    pub columns: Vec<String>,
    /// Preformatted `$select`, used when `columns` is empty
    pub columns_string: String,
}

impl<'a> RetrieveRequest<'a> {
    pub fn new(auth: &'a Authorization, table: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            auth,
            table: table.into(),
            id: id.into(),
            columns: Vec::new(),
            columns_string: String::new(),
        }
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn columns_string(mut self, columns: impl Into<String>) -> Self {
        self.columns_string = columns.into();
        self
    }
}

/// Retrieve the records of a table matching a filter
#[derive(Debug, Clone)]
pub struct RetrieveMultipleRequest<'a> {
    pub auth: &'a Authorization,
    pub table: String,
    pub columns: Vec<String>,
    pub columns_string: String,
    pub filter: Filter,
    /// Preformatted `$filter`, used when `filter` is not set
    pub filter_string: String,
}

impl<'a> RetrieveMultipleRequest<'a> {
    pub fn new(auth: &'a Authorization, table: impl Into<String>) -> Self {
        Self {
            auth,
            table: table.into(),
            columns: Vec::new(),
            columns_string: String::new(),
            filter: Filter::default(),
            filter_string: String::new(),
        }
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn columns_string(mut self, columns: impl Into<String>) -> Self {
        self.columns_string = columns.into();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter_string(mut self, filter: impl Into<String>) -> Self {
        self.filter_string = filter.into();
        self
    }
}

/// Create a record, or update it when `id` is set
#[derive(Debug, Clone)]
pub struct CreateUpdateRequest<'a> {
    pub auth: &'a Authorization,
    pub table: String,
    pub id: String,
    pub row: Record,
}

impl<'a> CreateUpdateRequest<'a> {
    pub fn create(auth: &'a Authorization, table: impl Into<String>, row: Record) -> Self {
        Self {
            auth,
            table: table.into(),
            id: String::new(),
            row,
        }
    }

    pub fn update(auth: &'a Authorization, table: impl Into<String>, id: impl Into<String>, row: Record) -> Self {
        Self {
            auth,
            table: table.into(),
            id: id.into(),
            row,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteRequest<'a> {
    pub auth: &'a Authorization,
    pub table: String,
    pub id: String,
}

impl<'a> DeleteRequest<'a> {
    pub fn new(auth: &'a Authorization, table: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            auth,
            table: table.into(),
            id: id.into(),
        }
    }
}

/// Writes submitted together as one changeset
#[derive(Debug, Clone)]
pub struct BatchRequestParams<'a> {
    pub auth: &'a Authorization,
    pub operations: Vec<BatchOperation>,
    /// Fixed boundary discriminator; random when `None`
    pub seed: Option<u32>,
}

impl<'a> BatchRequestParams<'a> {
    pub fn new(auth: &'a Authorization, operations: Vec<BatchOperation>) -> Self {
        Self {
            auth,
            operations,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Dataverse Web API client
///
/// Every call validates its arguments locally before any request is sent.
#[derive(Clone)]
pub struct DataverseClient {
    transport: Arc<dyn Transport>,
    completion: RequestCompletion,
}

impl DataverseClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, ResilienceConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: ResilienceConfig) -> Self {
        let completion = RequestCompletion::with_config(Arc::clone(&transport), config);
        Self { transport, completion }
    }

    /// Client on a reqwest transport with the given timeouts
    pub fn with_timeouts(config: ResilienceConfig, request_timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let transport = ReqwestTransport::new(request_timeout, connect_timeout)?;
        Ok(Self::with_config(Arc::new(transport), config))
    }

    /// Underlying completion, for spawning calls onto their own tasks
    pub fn completion(&self) -> &RequestCompletion {
        &self.completion
    }

    pub async fn authenticate(&self, credentials: &ClientCredentials, org_url: &str) -> Result<Authorization> {
        auth::authenticate(self.transport.as_ref(), credentials, org_url).await
    }

    pub async fn retrieve(&self, request: RetrieveRequest<'_>) -> Result<Record> {
        require_auth(request.auth)?;
        require_table(&request.table)?;
        require_id(&request.id)?;

        let url = Query::new(request.table)
            .with_id(request.id)
            .with_select(&request.columns, &request.columns_string)
            .to_url(&request.auth.url);

        self.completion.get(&url, &request.auth.token).await
    }

    pub async fn retrieve_multiple(&self, request: RetrieveMultipleRequest<'_>) -> Result<Record> {
        require_auth(request.auth)?;
        require_table(&request.table)?;

        let url = Query::new(request.table)
            .with_select(&request.columns, &request.columns_string)
            .with_filter(&request.filter, &request.filter_string)
            .to_url(&request.auth.url);

        self.completion.get(&url, &request.auth.token).await
    }

    /// Returns the id of the written record; empty when it cannot be determined
    pub async fn create_update(&self, request: CreateUpdateRequest<'_>) -> Result<String> {
        require_auth(request.auth)?;
        require_table(&request.table)?;

        let auth = request.auth;
        let result = if request.id.is_empty() {
            let url = constants::entity_endpoint(&auth.url, &request.table);
            self.completion.post(&url, &auth.token, &request.row).await?
        } else {
            let url = constants::entity_record_endpoint(&auth.url, &request.table, &request.id);
            self.completion.patch(&url, &auth.token, &request.row).await?
        };

        Ok(record_id(&result))
    }

    pub async fn delete(&self, request: DeleteRequest<'_>) -> Result<()> {
        require_auth(request.auth)?;
        require_table(&request.table)?;
        require_id(&request.id)?;

        let url = constants::entity_record_endpoint(&request.auth.url, &request.table, &request.id);
        self.completion.delete(&url, &request.auth.token).await?;
        Ok(())
    }

    pub async fn batch(&self, request: BatchRequestParams<'_>) -> Result<BatchOutcome> {
        require_auth(request.auth)?;

        let builder = match request.seed {
            Some(seed) => BatchRequestBuilder::with_seed(&request.auth.url, seed),
            None => BatchRequestBuilder::new(&request.auth.url),
        };
        let batch = builder.add_operations(request.operations).build()?;

        log::debug!("Submitting batch {} ({} bytes)", batch.boundary, batch.body.len());
        self.completion.post_batch(&request.auth.url, &request.auth.token, &batch).await
    }
}

fn require_auth(auth: &Authorization) -> Result<()> {
    if auth.is_set() { Ok(()) } else { Err(ApiError::validation("Empty auth")) }
}

fn require_table(table: &str) -> Result<()> {
    if table.is_empty() { Err(ApiError::validation("Empty table")) } else { Ok(()) }
}

fn require_id(id: &str) -> Result<()> {
    if id.is_empty() { Err(ApiError::validation("Empty Id")) } else { Ok(()) }
}
