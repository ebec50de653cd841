//! OData query construction
//!
//! Filter trees compile to `$filter` expressions; [`Query`] assembles the
//! final retrieve URL.

pub mod filters;
pub mod query;

pub use filters::{Combinator, Condition, Filter};
pub use query::Query;
