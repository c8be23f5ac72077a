//! Error types for the shared Vigil types.

use thiserror::Error;

use crate::filter::{FieldId, Operator};

/// Result type alias using the types error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing filter or paging values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Value shape does not fit the operator.
    #[error("filter on '{field}' with {operator} expects a {expected} value, got {actual}")]
    FilterShape {
        field: FieldId,
        operator: Operator,
        expected: &'static str,
        actual: &'static str,
    },

    /// Operator is not allowed on this field.
    #[error("operator {operator} is not supported on '{field}'")]
    UnsupportedOperator { field: FieldId, operator: Operator },

    /// Collection value is empty.
    #[error("filter on '{field}' has an empty value")]
    EmptyValue { field: FieldId },

    /// Page number or size out of range.
    #[error("invalid page request: {0}")]
    InvalidPage(String),
}
