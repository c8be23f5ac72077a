//! One-shot operations against the orchestration API.
//!
//! Each task validates its input before the first network call, builds its
//! filters through [`FilterBuilder`](crate::filter::FilterBuilder) and walks
//! the search endpoint through [`PageWalker`](crate::walker::PageWalker).

pub mod assets;
pub mod executions;
pub mod logs;
pub mod namespaces;
pub mod test_suites;
pub mod triggers;

use crate::error::{EngineError, Result};

/// Trimmed `value`, or [`EngineError::EmptyRequiredValue`] naming `what`.
pub(crate) fn require<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::EmptyRequiredValue(what.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
pub(crate) mod testing {
    use vigil_client::VigilClient;
    use wiremock::MockServer;

    pub fn client_for(server: &MockServer) -> VigilClient {
        VigilClient::builder()
            .base_url(server.uri())
            .build()
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_trims() {
        assert_eq!(require("  abc ", "id").unwrap(), "abc");
        assert!(matches!(
            require("   ", "execution id"),
            Err(EngineError::EmptyRequiredValue(what)) if what == "execution id"
        ));
    }
}
