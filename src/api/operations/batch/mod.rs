//! Batch operations module for the Dataverse Web API
//!
//! Provides $batch request building and response parsing

pub mod builder;
pub mod parser;

pub use builder::{BatchRequest, BatchRequestBuilder, encode};
pub use parser::{BatchResponseItem, BatchResponseParser};
