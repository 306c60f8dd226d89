//! Lookup dispatch seam between records and their backing data source.
//!
//! # Responsibility
//! - Define the `(record type, method, params)` dispatch contract.
//! - Provide an in-process implementation for embedding and tests.
//!
//! # Invariants
//! - Dispatch never mutates records; it only answers lookups.
//! - Unknown methods fail with `UnknownMethod`, never with an empty result.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;

pub use memory::MemoryDataSource;

/// Method name for duplicate-key lookups.
pub const FIND_EXISTING: &str = "findExisting";
/// Method name for reference checks.
pub const USED: &str = "used";

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    UnknownMethod { record_type: String, method: String },
    InvalidParams { method: String, message: String },
    /// Backend-specific failure surfaced as text.
    Backend(String),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMethod {
                record_type,
                method,
            } => write!(f, "unknown dispatch method {record_type}.{method}"),
            Self::InvalidParams { method, message } => {
                write!(f, "invalid params for {method}: {message}")
            }
            Self::Backend(message) => write!(f, "data source failure: {message}"),
        }
    }
}

impl Error for DispatchError {}

/// Backend that answers named lookups for a record type.
pub trait DataSource {
    fn dispatch(&self, record_type: &str, method: &str, params: &Value) -> DispatchResult<Value>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn dispatch(&self, record_type: &str, method: &str, params: &Value) -> DispatchResult<Value> {
        (**self).dispatch(record_type, method, params)
    }
}
