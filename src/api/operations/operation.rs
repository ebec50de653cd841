//! Write operations that can be grouped into a batch

use crate::api::error::{ApiError, Result};
use crate::api::models::Record;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// A single write inside a batch changeset
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperation {
    /// HTTP verb of the sub-request (usually POST or PATCH)
    pub verb: Method,
    /// Table (entity set) name, e.g. "contacts"
    pub table: String,
    /// Record fields
    pub payload: Record,
}

impl BatchOperation {
    pub fn new(verb: Method, table: impl Into<String>, payload: Record) -> Self {
        Self {
            verb,
            table: table.into(),
            payload,
        }
    }

    /// Create a new record
    pub fn create(table: impl Into<String>, payload: Record) -> Self {
        Self::new(Method::POST, table, payload)
    }

    /// Patch a record; `table` carries the key, e.g. `contacts(<id>)`
    pub fn update(table: impl Into<String>, payload: Record) -> Self {
        Self::new(Method::PATCH, table, payload)
    }

    /// Build the payload from any serializable value.
    ///
    /// Fails when the value does not serialize to a JSON object.
    pub fn from_serializable<T: Serialize>(verb: Method, table: impl Into<String>, payload: &T) -> Result<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(map) => Ok(Self::new(verb, table, map)),
            other => Err(ApiError::Encoding(format!(
                "batch payload must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Serialized payload as written into the batch body
    pub fn payload_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.payload)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
