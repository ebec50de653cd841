//! Dataverse Web API client
//!
//! Filter compilation, batch encoding and the request completion model,
//! plus the thin per-call wrappers built on top of them.

pub mod auth;
pub mod client;
pub mod completion;
pub mod constants;
pub mod error;
pub mod models;
pub mod operations;
pub mod query;
pub mod resilience;
pub mod transport;

pub use auth::{ClientCredentials, authenticate};
pub use client::{
    BatchRequestParams, CreateUpdateRequest, DataverseClient, DeleteRequest, RetrieveMultipleRequest, RetrieveRequest,
};
pub use completion::{BatchOutcome, Pending, RequestCompletion};
pub use error::{ApiError, Result};
pub use models::{Authorization, Record};
pub use operations::{BatchOperation, BatchRequest, BatchRequestBuilder, BatchResponseItem, BatchResponseParser};
pub use query::{Combinator, Condition, Filter, Query};
pub use resilience::{ApiLogger, MonitoringConfig, ResilienceConfig, RetryConfig, RetryPolicy, RetryableError};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
