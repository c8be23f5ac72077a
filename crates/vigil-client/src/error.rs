//! Errors raised while talking to the orchestration server.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never got a response (connect, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any non-success status other than 401, 403 and 404.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The server rejected the credentials (401 or 403).
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The addressed execution, asset or test suite does not exist (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The client was built with unusable settings.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Classify a failed response by status code.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Error::Auth(message),
            404 => Error::NotFound(message),
            _ => Error::Api { status, message },
        }
    }

    /// Whether the addressed resource does not exist.
    ///
    /// Callers use this to skip records that disappeared between a search
    /// and a follow-up lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Api { status: 404, .. })
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Body of a server error response; only the message is read.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(Error::from_status(401, "x".into()), Error::Auth(_)));
        assert!(matches!(Error::from_status(403, "x".into()), Error::Auth(_)));
        assert!(Error::from_status(404, "gone".into()).is_not_found());
        assert!(matches!(
            Error::from_status(503, "busy".into()),
            Error::Api { status: 503, .. }
        ));
    }
}
