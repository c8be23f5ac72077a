//! Watches assets for overdue updates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vigil_types::{Asset, FieldId, LARGE_PAGE_SIZE, PageRequest};

use crate::classifier::{MissingTimestamp, StaleAsset, StalenessRule, classify_asset};
use crate::error::Result;
use crate::filter::{
    FilterBuilder, FilterCriteria, FilterOptions, MetadataQuery, MultiValue, NamespaceMatch,
};
use crate::walker::PageWalker;

use super::source::AssetSource;
use super::{Monitor, MonitorEvent};

/// Configuration of a [`FreshnessMonitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessSettings {
    pub name: String,
    pub interval: Duration,
    pub max_staleness: Duration,
    pub namespace: Option<String>,
    pub asset_id: Option<String>,
    pub types: Vec<String>,
    pub metadata: Vec<MetadataQuery>,
    pub missing_timestamp: MissingTimestamp,
}

impl FreshnessSettings {
    pub fn new(name: impl Into<String>, interval: Duration, max_staleness: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            max_staleness,
            namespace: None,
            asset_id: None,
            types: Vec::new(),
            metadata: Vec::new(),
            missing_timestamp: MissingTimestamp::default(),
        }
    }

    fn rule(&self, now: DateTime<Utc>) -> StalenessRule {
        StalenessRule {
            max_staleness: self.max_staleness,
            now,
            missing_timestamp: self.missing_timestamp,
        }
    }
}

/// Monitor over the assets matching its settings.
pub struct FreshnessMonitor {
    settings: FreshnessSettings,
    source: Arc<dyn AssetSource>,
}

impl FreshnessMonitor {
    pub fn new(settings: FreshnessSettings, source: Arc<dyn AssetSource>) -> Self {
        Self { settings, source }
    }

    pub fn settings(&self) -> &FreshnessSettings {
        &self.settings
    }
}

#[async_trait]
impl Monitor for FreshnessMonitor {
    type Record = Asset;

    fn name(&self) -> &str {
        &self.settings.name
    }

    fn interval(&self) -> Duration {
        self.settings.interval
    }

    /// Fetch the assets the server already considers stale.
    ///
    /// Assets that never reported an update are only fetched when they are to
    /// be reported, since the `updated` filter would exclude them.
    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<Asset>> {
        let rule = self.settings.rule(now);
        let end_date = match self.settings.missing_timestamp {
            MissingTimestamp::Skip => rule.threshold(),
            MissingTimestamp::Stale => None,
        };

        let criteria = FilterCriteria {
            namespace: self.settings.namespace.clone(),
            id: self.settings.asset_id.clone(),
            types: self.settings.types.clone(),
            metadata: self.settings.metadata.clone(),
            end_date,
            ..FilterCriteria::default()
        };
        let options = FilterOptions::default()
            .with_namespace_match(NamespaceMatch::Exact)
            .with_multi_value(MultiValue::In)
            .with_id_field(FieldId::Id)
            .with_date_fields(FieldId::Updated, FieldId::Updated);
        let filters = FilterBuilder::new(options).build(&criteria, now)?;

        let request = PageRequest::all(LARGE_PAGE_SIZE)?;
        let walk = PageWalker::walk(&request, |page, size| {
            self.source.search_assets(page, size, &filters)
        })
        .await?;

        tracing::debug!(
            monitor = %self.settings.name,
            assets = walk.records.len(),
            "fetched assets"
        );
        Ok(walk.records)
    }

    fn classify(&self, records: &[Asset], now: DateTime<Utc>) -> Option<MonitorEvent> {
        let rule = self.settings.rule(now);
        let assets: Vec<StaleAsset> = records
            .iter()
            .filter_map(|asset| classify_asset(asset, &rule))
            .collect();

        if !assets.is_empty() {
            tracing::info!(
                monitor = %self.settings.name,
                stale = assets.len(),
                "stale assets found"
            );
        }
        (!assets.is_empty()).then_some(MonitorEvent::StaleAssets { assets })
    }
}
