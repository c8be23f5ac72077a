//! Trigger toggling and one-shot schedule health detection.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use vigil_client::VigilClient;
use vigil_types::TriggerRecord;

use crate::classifier::{AnomalyVerdict, DetectedTrigger};
use crate::error::Result;
use crate::filter::{FilterBuilder, FilterCriteria, FilterOptions, NamespaceMatch};
use crate::monitor::{Monitor, MonitorEvent, ScheduleMonitor, ScheduleSettings, TriggerSource};

use super::require;

// ─────────────────────────────────────────────────────────────────────────────
// Toggle
// ─────────────────────────────────────────────────────────────────────────────

/// Which triggers to enable or disable.
#[derive(Debug, Clone, Default)]
pub struct ToggleRequest {
    pub namespace: Option<String>,
    pub flow_id: Option<String>,
    pub trigger_id: Option<String>,
    pub enabled: bool,
}

/// Enable or disable every trigger matching the request.
///
/// Returns the number of triggers the server changed.
pub async fn toggle(
    client: &VigilClient,
    request: &ToggleRequest,
    now: DateTime<Utc>,
) -> Result<u64> {
    let criteria = FilterCriteria {
        namespace: request.namespace.clone(),
        flow_id: request.flow_id.clone(),
        trigger_id: request.trigger_id.clone(),
        ..FilterCriteria::default()
    };
    let filters = FilterBuilder::new(
        FilterOptions::default().with_namespace_match(NamespaceMatch::Exact),
    )
    .build(&criteria, now)?;

    let response = client
        .triggers()
        .set_disabled_by_query(!request.enabled, &filters)
        .await?;

    tracing::info!(
        enabled = request.enabled,
        count = response.count,
        "toggled triggers"
    );
    Ok(response.count)
}

/// Toggle one trigger of one flow; every identifier is required.
pub async fn toggle_one(
    client: &VigilClient,
    request: &ToggleRequest,
    now: DateTime<Utc>,
) -> Result<u64> {
    require(request.namespace.as_deref().unwrap_or_default(), "namespace")?;
    require(request.flow_id.as_deref().unwrap_or_default(), "flow id")?;
    require(request.trigger_id.as_deref().unwrap_or_default(), "trigger id")?;
    toggle(client, request, now).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Detect
// ─────────────────────────────────────────────────────────────────────────────

/// Delay tolerated by [`detect`] when none is given.
pub const DEFAULT_DETECT_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Schedules found unhealthy by [`detect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectReport {
    pub disabled: Vec<TriggerRecord>,
    /// Every enabled schedule with a verdict, including missing schedules
    /// and overlong executions.
    pub stuck: Vec<DetectedTrigger>,
    pub total_found: usize,
    pub summary: String,
}

/// Check every schedule trigger under `namespace` once.
pub async fn detect(
    source: Arc<dyn TriggerSource>,
    namespace: Option<&str>,
    threshold: Duration,
    now: DateTime<Utc>,
) -> Result<DetectReport> {
    let mut settings = ScheduleSettings::new("detect", threshold);
    settings.namespace = namespace.map(str::to_string);
    settings.allowed_delay = threshold;
    settings.include_disabled = true;

    let monitor = ScheduleMonitor::new(settings, source);
    let records = monitor.fetch(now).await?;

    let mut disabled = Vec::new();
    let mut stuck = Vec::new();
    if let Some(MonitorEvent::Schedules { triggers }) = monitor.classify(&records, now) {
        for detected in triggers {
            match detected.verdict {
                AnomalyVerdict::Disabled => disabled.push(detected.trigger),
                _ => stuck.push(detected),
            }
        }
    }

    let total_found = disabled.len() + stuck.len();
    tracing::info!(
        checked = records.len(),
        disabled = disabled.len(),
        stuck = stuck.len(),
        "schedule detection complete"
    );
    Ok(DetectReport {
        disabled,
        stuck,
        total_found,
        summary: format!("Detection complete: {total_found} issues found"),
    })
}
