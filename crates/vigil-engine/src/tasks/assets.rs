//! Asset listing, maintenance and purge.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vigil_client::VigilClient;
use vigil_types::{Asset, FieldId, LARGE_PAGE_SIZE, PageRequest};

use crate::error::{EngineError, Result};
use crate::filter::{
    FilterBuilder, FilterCriteria, FilterOptions, MetadataQuery, MultiValue, NamespaceMatch,
};
use crate::projector::{FetchMode, Projection, project};
use crate::sink::RecordSink;
use crate::walker::PageWalker;

use super::require;

// ─────────────────────────────────────────────────────────────────────────────
// List
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AssetQuery {
    /// Namespace, asset id, types and metadata are honoured.
    pub criteria: FilterCriteria,
    pub page: Option<u32>,
    pub size: u32,
    pub fetch_mode: FetchMode,
}

impl Default for AssetQuery {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            page: None,
            size: LARGE_PAGE_SIZE,
            fetch_mode: FetchMode::Store,
        }
    }
}

pub async fn list(
    client: &VigilClient,
    request: &AssetQuery,
    now: DateTime<Utc>,
    sink: &mut dyn RecordSink,
) -> Result<Projection<Asset>> {
    let page = PageRequest::new(request.page, request.size)?;
    let filters = FilterBuilder::new(
        FilterOptions::default()
            .with_namespace_match(NamespaceMatch::Exact)
            .with_multi_value(MultiValue::In),
    )
    .build(&request.criteria, now)?;

    let api = client.assets();
    let walk = PageWalker::walk(&page, |page, size| api.search(page, size, &filters)).await?;

    tracing::info!(found = walk.records.len(), "listed assets");
    project(walk.records, request.fetch_mode, sink).await
}

/// Delete one asset.
pub async fn delete(client: &VigilClient, asset_id: &str) -> Result<()> {
    let id = require(asset_id, "asset id")?;
    client
        .assets()
        .delete(id)
        .await
        .map_err(|e| EngineError::not_found_as(e, format!("asset {id}")))?;
    tracing::info!(asset_id = id, "deleted asset");
    Ok(())
}

/// Create or update an asset; returns the stored version.
pub async fn set(client: &VigilClient, asset: &Asset) -> Result<Asset> {
    require(&asset.id, "asset id")?;
    require(&asset.asset_type, "asset type")?;
    let stored = client.assets().create(asset).await?;
    tracing::info!(asset_id = %stored.id, asset_type = %stored.asset_type, "stored asset");
    Ok(stored)
}

// ─────────────────────────────────────────────────────────────────────────────
// Purge
// ─────────────────────────────────────────────────────────────────────────────

/// Bulk deletion of assets and their recorded events up to `end_date`.
#[derive(Debug, Clone)]
pub struct PurgeRequest {
    /// Namespace scope; children are included.
    pub namespace: Option<String>,
    pub asset_id: Option<String>,
    pub types: Vec<String>,
    pub metadata: Vec<MetadataQuery>,
    /// Only records last touched at or before this instant are purged.
    pub end_date: DateTime<Utc>,
    pub purge_assets: bool,
    pub purge_usages: bool,
    pub purge_lineage: bool,
}

impl PurgeRequest {
    pub fn new(end_date: DateTime<Utc>) -> Self {
        Self {
            namespace: None,
            asset_id: None,
            types: Vec::new(),
            metadata: Vec::new(),
            end_date,
            purge_assets: true,
            purge_usages: true,
            purge_lineage: true,
        }
    }

    /// Usage and lineage events carry neither type nor metadata, and lineage
    /// events cannot be selected by asset id either.
    fn check_supported(&self) -> Result<()> {
        let filters_assets = !self.types.is_empty() || !self.metadata.is_empty();
        if self.purge_usages && filters_assets {
            return Err(EngineError::Unsupported(
                "usage events cannot be filtered by asset type or metadata".to_string(),
            ));
        }
        if self.purge_lineage && (filters_assets || self.asset_id.is_some()) {
            return Err(EngineError::Unsupported(
                "lineage events cannot be filtered by asset id, type or metadata".to_string(),
            ));
        }
        Ok(())
    }
}

/// Number of records removed per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeOutcome {
    pub assets: u64,
    pub usages: u64,
    pub lineage_events: u64,
}

pub async fn purge(
    client: &VigilClient,
    request: &PurgeRequest,
    now: DateTime<Utc>,
) -> Result<PurgeOutcome> {
    request.check_supported()?;

    let criteria = FilterCriteria {
        namespace: request.namespace.clone(),
        id: request.asset_id.clone(),
        types: request.types.clone(),
        metadata: request.metadata.clone(),
        end_date: Some(request.end_date),
        ..FilterCriteria::default()
    };
    let options = FilterOptions::default()
        .with_namespace_match(NamespaceMatch::Prefix)
        .with_multi_value(MultiValue::In);

    let asset_filters = FilterBuilder::new(
        options
            .with_id_field(FieldId::Id)
            .with_date_fields(FieldId::Updated, FieldId::Updated),
    )
    .build(&criteria, now)?;
    let event_filters = FilterBuilder::new(
        options
            .with_id_field(FieldId::AssetId)
            .with_date_fields(FieldId::Created, FieldId::Created),
    )
    .build(&criteria, now)?;

    let mut outcome = PurgeOutcome::default();
    if request.purge_assets {
        outcome.assets = client.assets().delete_by_query(&asset_filters).await?.count;
    }
    if request.purge_usages {
        outcome.usages = client
            .assets()
            .delete_usages_by_query(&event_filters)
            .await?
            .count;
    }
    if request.purge_lineage {
        outcome.lineage_events = client
            .assets()
            .delete_lineage_events_by_query(&event_filters)
            .await?
            .count;
    }

    tracing::info!(
        assets = outcome.assets,
        usages = outcome.usages,
        lineage_events = outcome.lineage_events,
        "purged assets"
    );
    Ok(outcome)
}
