//! Executions API.

use std::collections::BTreeMap;

use vigil_types::{Execution, FilterExpression, PageResult};

use crate::client::VigilClient;
use crate::error::Result;
use crate::query::{encode_filters, page_pairs};
use crate::types::DeleteExecutionOptions;

/// Executions API client.
pub struct ExecutionsApi {
    client: VigilClient,
}

impl ExecutionsApi {
    pub(crate) fn new(client: VigilClient) -> Self {
        Self { client }
    }

    /// Search executions matching all filters.
    pub async fn search(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<Execution>> {
        let mut query = page_pairs(page, size, None);
        query.extend(encode_filters(filters));
        self.client.get_with_query("executions/search", &query).await
    }

    /// Get an execution by ID.
    pub async fn get(&self, id: &str) -> Result<Execution> {
        self.client.get(&format!("executions/{}", id)).await
    }

    /// Kill a running execution, optionally cascading to its children.
    pub async fn kill(&self, id: &str, propagate: bool) -> Result<()> {
        let query = [("isOnKillCascade", propagate)];
        self.client
            .delete(&format!("executions/{}/kill", id), &query)
            .await
    }

    /// Resume a paused execution with the given inputs.
    pub async fn resume(
        &self,
        id: &str,
        inputs: &BTreeMap<String, serde_json::Value>,
    ) -> Result<()> {
        self.client
            .post_unit(&format!("executions/{}/resume", id), inputs)
            .await
    }

    /// Delete an execution and, depending on the options, its artifacts.
    pub async fn delete(&self, id: &str, options: DeleteExecutionOptions) -> Result<()> {
        self.client
            .delete(&format!("executions/{}", id), &options)
            .await
    }
}
