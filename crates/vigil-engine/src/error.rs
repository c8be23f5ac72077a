//! Error types for the evaluation engine.

use thiserror::Error;
use vigil_types::StateType;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while querying or evaluating remote records.
///
/// Validation variants are raised before any network call is made.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Criteria that cannot be combined into one query.
    #[error("Invalid filter combination: {0}")]
    InvalidFilterCombination(String),

    /// A value that must be present was missing or blank.
    #[error("Required value is empty: {0}")]
    EmptyRequiredValue(String),

    /// Page number or size out of range.
    #[error("Invalid page request: {0}")]
    InvalidPageRequest(String),

    /// The remote API call failed.
    #[error(transparent)]
    Transport(#[from] vigil_client::Error),

    /// Writing stored results failed.
    #[error("Sink error: {0}")]
    Sink(String),

    /// Handing an event to the execution generator failed.
    #[error("Failed to emit event: {0}")]
    Emit(String),

    /// The execution is still running.
    #[error("Execution {id} is not in a terminated state ({state})")]
    NotTerminated { id: String, state: StateType },

    /// The targeted resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote API cannot honour the request as given.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<vigil_types::Error> for EngineError {
    fn from(err: vigil_types::Error) -> Self {
        match err {
            vigil_types::Error::InvalidPage(message) => EngineError::InvalidPageRequest(message),
            vigil_types::Error::EmptyValue { field } => {
                EngineError::EmptyRequiredValue(field.to_string())
            }
            other => EngineError::InvalidFilterCombination(other.to_string()),
        }
    }
}

impl EngineError {
    /// Map a client 404 to [`EngineError::NotFound`], leaving other errors untouched.
    pub(crate) fn not_found_as(err: vigil_client::Error, what: impl Into<String>) -> Self {
        if err.is_not_found() {
            EngineError::NotFound(what.into())
        } else {
            EngineError::Transport(err)
        }
    }
}
