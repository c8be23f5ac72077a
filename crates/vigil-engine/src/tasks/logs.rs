//! Log search.

use chrono::{DateTime, Utc};
use vigil_client::VigilClient;
use vigil_types::{LARGE_PAGE_SIZE, LogEntry, PageRequest};

use crate::error::Result;
use crate::filter::{FilterBuilder, FilterCriteria, FilterOptions, NamespaceMatch};
use crate::projector::{FetchMode, Projection, project};
use crate::sink::RecordSink;
use crate::walker::PageWalker;

#[derive(Debug, Clone)]
pub struct LogQuery {
    /// Namespace, flow id, trigger id, execution id, min level, date range
    /// and free-text query are honoured.
    pub criteria: FilterCriteria,
    pub page: Option<u32>,
    pub size: u32,
    pub fetch_mode: FetchMode,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            page: None,
            size: LARGE_PAGE_SIZE,
            fetch_mode: FetchMode::Store,
        }
    }
}

pub async fn fetch(
    client: &VigilClient,
    request: &LogQuery,
    now: DateTime<Utc>,
    sink: &mut dyn RecordSink,
) -> Result<Projection<LogEntry>> {
    let page = PageRequest::new(request.page, request.size)?;
    let filters = FilterBuilder::new(
        FilterOptions::default().with_namespace_match(NamespaceMatch::Exact),
    )
    .build(&request.criteria, now)?;

    let api = client.logs();
    let walk = PageWalker::walk(&page, |page, size| api.search(page, size, &filters)).await?;

    tracing::info!(found = walk.records.len(), "fetched logs");
    project(walk.records, request.fetch_mode, sink).await
}
