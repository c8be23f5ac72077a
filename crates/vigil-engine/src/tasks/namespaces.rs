//! Namespace listing.

use vigil_client::VigilClient;
use vigil_types::{NamespaceRecord, PageRequest, SMALL_PAGE_SIZE};

use crate::error::Result;
use crate::walker::{PageWalker, Walk};

#[derive(Debug, Clone)]
pub struct NamespaceListing {
    /// Only namespaces starting with this prefix.
    pub prefix: Option<String>,
    /// Skip namespaces that exist only because a flow names them.
    pub existing_only: bool,
    pub page: Option<u32>,
    pub size: u32,
}

impl Default for NamespaceListing {
    fn default() -> Self {
        Self {
            prefix: None,
            existing_only: false,
            page: None,
            size: SMALL_PAGE_SIZE,
        }
    }
}

pub async fn list(client: &VigilClient, request: &NamespaceListing) -> Result<Walk<NamespaceRecord>> {
    let page = PageRequest::new(request.page, request.size)?;
    let prefix = request.prefix.as_deref().map(str::trim);

    let api = client.namespaces();
    let walk = PageWalker::walk(&page, |page, size| {
        api.search(page, size, prefix, request.existing_only)
    })
    .await?;

    tracing::info!(found = walk.records.len(), "listed namespaces");
    Ok(walk)
}
