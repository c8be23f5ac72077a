//! Logs API.

use vigil_types::{FilterExpression, LogEntry, PageResult};

use crate::client::VigilClient;
use crate::error::Result;
use crate::query::{encode_filters, page_pairs};

/// Logs API client.
pub struct LogsApi {
    client: VigilClient,
}

impl LogsApi {
    pub(crate) fn new(client: VigilClient) -> Self {
        Self { client }
    }

    /// Search log lines matching all filters.
    pub async fn search(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<LogEntry>> {
        let mut query = page_pairs(page, size, None);
        query.extend(encode_filters(filters));
        self.client.get_with_query("logs/search", &query).await
    }
}
