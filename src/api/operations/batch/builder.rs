//! Dataverse $batch request builder
//!
//! Writes a single changeset in multipart/mixed format. Boundary tokens are
//! drawn from a caller-supplied random source so tests can pin them.

use crate::api::constants::{self, headers};
use crate::api::error::Result;
use crate::api::operations::BatchOperation;
use rand::Rng;

const NEWLINE: &str = "\n";

/// Upper bound (exclusive) of the boundary discriminator
const BOUNDARY_RANGE: u32 = 100;

/// Builder for a Dataverse $batch request
pub struct BatchRequestBuilder {
    seed: u32,
    base_url: String,
    operations: Vec<BatchOperation>,
}

impl BatchRequestBuilder {
    /// Boundary discriminator from the thread-local RNG
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_rng(base_url, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng>(base_url: impl Into<String>, rng: &mut R) -> Self {
        Self::with_seed(base_url, rng.gen_range(0..BOUNDARY_RANGE))
    }

    /// Fixed boundary discriminator
    pub fn with_seed(base_url: impl Into<String>, seed: u32) -> Self {
        Self {
            seed,
            base_url: base_url.into(),
            operations: Vec::new(),
        }
    }

    pub fn add_operation(mut self, operation: BatchOperation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn add_operations(mut self, operations: impl IntoIterator<Item = BatchOperation>) -> Self {
        self.operations.extend(operations);
        self
    }

    /// Build the complete batch request body
    pub fn build(self) -> Result<BatchRequest> {
        let payloads = self
            .operations
            .iter()
            .map(BatchOperation::payload_json)
            .collect::<Result<Vec<_>>>()?;

        // Tokens only need to stay clear of the content they delimit
        let mut seed = self.seed;
        while payloads
            .iter()
            .any(|p| p.contains(&batch_boundary(seed)) || p.contains(&changeset_boundary(seed)))
        {
            seed = seed.wrapping_add(1);
        }
        let boundary = batch_boundary(seed);
        let changeset = changeset_boundary(seed);

        let mut body = String::new();
        body.push_str(&format!("--{}{}", boundary, NEWLINE));
        body.push_str(&format!("Content-Type: multipart/mixed;boundary={}{}", changeset, NEWLINE));
        body.push_str(NEWLINE);

        for (content_id, (operation, payload)) in self.operations.iter().zip(&payloads).enumerate() {
            body.push_str(&format!("--{}{}", changeset, NEWLINE));
            body.push_str(&format!("Content-Type: application/http{}", NEWLINE));
            body.push_str(&format!("Content-Transfer-Encoding: binary{}", NEWLINE));
            body.push_str(&format!("Content-ID: {}{}", content_id, NEWLINE));
            body.push_str(NEWLINE);

            // HTTP request line
            body.push_str(&format!(
                "{} {} HTTP/1.1{}",
                operation.verb,
                constants::changeset_target(&self.base_url, &operation.table),
                NEWLINE
            ));
            body.push_str(&format!("{}: {}{}", headers::CONTENT_TYPE, headers::CONTENT_TYPE_JSON, NEWLINE));
            body.push_str(NEWLINE);

            body.push_str(payload);
            body.push_str(NEWLINE);
        }

        body.push_str(&format!("--{}--{}", changeset, NEWLINE));
        body.push_str(NEWLINE);
        body.push_str(&format!("--{}--", boundary));

        Ok(BatchRequest {
            body,
            boundary,
            changeset,
        })
    }
}

pub fn batch_boundary(seed: u32) -> String {
    format!("batch_AAA00{}", seed)
}

pub fn changeset_boundary(seed: u32) -> String {
    format!("changeset_BBB00{}", seed)
}

/// Complete batch request ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub body: String,
    /// Outer boundary, needed for the request Content-Type
    pub boundary: String,
    pub changeset: String,
}

impl BatchRequest {
    /// Get the Content-Type header value
    pub fn content_type(&self) -> String {
        format!("multipart/mixed;boundary={}", self.boundary)
    }
}

/// Encode `operations` against `base_url`, returning the body and the batch boundary
pub fn encode(base_url: &str, operations: &[BatchOperation]) -> Result<(String, String)> {
    let request = BatchRequestBuilder::new(base_url)
        .add_operations(operations.iter().cloned())
        .build()?;
    Ok((request.body, request.boundary))
}
