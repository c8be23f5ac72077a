//! Triggers API.

use vigil_types::{FilterExpression, PageResult};

use crate::client::VigilClient;
use crate::error::Result;
use crate::query::{encode_filters, page_pairs};
use crate::types::{CountResponse, TriggerSearchItem};

/// Triggers API client.
pub struct TriggersApi {
    client: VigilClient,
}

impl TriggersApi {
    pub(crate) fn new(client: VigilClient) -> Self {
        Self { client }
    }

    /// Search triggers matching all filters.
    ///
    /// Items are returned as sent by the server; use
    /// [`TriggerSearchItem::into_record`] to flatten them.
    pub async fn search(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<TriggerSearchItem>> {
        let mut query = page_pairs(page, size, None);
        query.extend(encode_filters(filters));
        self.client.get_with_query("triggers/search", &query).await
    }

    /// Enable or disable every trigger matching the filters.
    pub async fn set_disabled_by_query(
        &self,
        disabled: bool,
        filters: &[FilterExpression],
    ) -> Result<CountResponse> {
        let mut query = vec![("disabled".to_string(), disabled.to_string())];
        query.extend(encode_filters(filters));
        self.client
            .post_with_query("triggers/set-disabled/by-query", &query)
            .await
    }
}
