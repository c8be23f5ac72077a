//! Namespaces API.

use vigil_types::{NamespaceRecord, PageResult};

use crate::client::VigilClient;
use crate::error::Result;
use crate::query::page_pairs;

/// Namespaces API client.
pub struct NamespacesApi {
    client: VigilClient,
}

impl NamespacesApi {
    pub(crate) fn new(client: VigilClient) -> Self {
        Self { client }
    }

    /// Search namespaces whose id starts with `prefix`.
    ///
    /// With `existing_only` the server omits namespaces that are only implied
    /// by flow declarations.
    pub async fn search(
        &self,
        page: u32,
        size: u32,
        prefix: Option<&str>,
        existing_only: bool,
    ) -> Result<PageResult<NamespaceRecord>> {
        let mut query = page_pairs(page, size, None);
        query.push(("existing".to_string(), existing_only.to_string()));
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            query.push(("q".to_string(), prefix.to_string()));
        }
        self.client.get_with_query("namespaces/search", &query).await
    }
}
