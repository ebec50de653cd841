//! Batched write operations
//!
//! Create/update operations that are encoded together into one `$batch`
//! changeset, and the decoding of the batch response.

pub mod batch;
pub mod operation;

pub use batch::{BatchRequest, BatchRequestBuilder, BatchResponseItem, BatchResponseParser};
pub use operation::BatchOperation;
