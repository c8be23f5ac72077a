//! Where monitors read remote state from.

use async_trait::async_trait;
use vigil_client::{TriggerSearchItem, VigilClient};
use vigil_types::{Asset, Execution, FilterExpression, PageResult};

use crate::error::Result;

/// Read access to triggers and the executions they started.
#[async_trait]
pub trait TriggerSource: Send + Sync {
    async fn search_triggers(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<TriggerSearchItem>>;

    async fn get_execution(&self, id: &str) -> Result<Execution>;
}

/// Read access to assets.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn search_assets(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<Asset>>;
}

#[async_trait]
impl TriggerSource for VigilClient {
    async fn search_triggers(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<TriggerSearchItem>> {
        Ok(self.triggers().search(page, size, filters).await?)
    }

    async fn get_execution(&self, id: &str) -> Result<Execution> {
        Ok(self.executions().get(id).await?)
    }
}

#[async_trait]
impl AssetSource for VigilClient {
    async fn search_assets(
        &self,
        page: u32,
        size: u32,
        filters: &[FilterExpression],
    ) -> Result<PageResult<Asset>> {
        Ok(self.assets().search(page, size, filters).await?)
    }
}
