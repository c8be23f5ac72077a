//! Assets API.

use vigil_types::{Asset, FilterExpression, PageResult};

use crate::client::VigilClient;
use crate::error::Result;
use crate::query::{encode_filters, page_pairs};
use crate::types::CountResponse;

/// Assets API client.
pub struct AssetsApi {
    client: VigilClient,
}

impl AssetsApi {
    pub(crate) fn new(client: VigilClient) -> Self {
        Self { client }
    }

    /// Search assets matching all filters.
    pub async fn search(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<Asset>> {
        let mut query = page_pairs(page, size, None);
        query.extend(encode_filters(filters));
        self.client.get_with_query("assets/search", &query).await
    }

    /// Get an asset by ID.
    pub async fn get(&self, id: &str) -> Result<Asset> {
        self.client.get(&format!("assets/{}", id)).await
    }

    /// Create or replace an asset.
    pub async fn create(&self, asset: &Asset) -> Result<Asset> {
        self.client.post("assets", asset).await
    }

    /// Delete an asset by ID.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete(&format!("assets/{}", id), &[] as &[(&str, &str)])
            .await
    }

    /// Delete every asset matching the filters.
    pub async fn delete_by_query(&self, filters: &[FilterExpression]) -> Result<CountResponse> {
        self.client
            .delete_returning("assets/by-query", &encode_filters(filters))
            .await
    }

    /// Delete asset usage events matching the filters.
    pub async fn delete_usages_by_query(
        &self,
        filters: &[FilterExpression],
    ) -> Result<CountResponse> {
        self.client
            .delete_returning("assets/usages/by-query", &encode_filters(filters))
            .await
    }

    /// Delete asset lineage events matching the filters.
    pub async fn delete_lineage_events_by_query(
        &self,
        filters: &[FilterExpression],
    ) -> Result<CountResponse> {
        self.client
            .delete_returning("assets/lineage-events/by-query", &encode_filters(filters))
            .await
    }
}
