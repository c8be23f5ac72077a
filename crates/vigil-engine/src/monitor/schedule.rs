//! Watches schedule triggers for missed or overdue runs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vigil_types::{LARGE_PAGE_SIZE, PageRequest, TriggerRecord};

use crate::classifier::{DEFAULT_ALLOWED_DELAY, DetectedTrigger, ScheduleRules, classify};
use crate::error::{EngineError, Result};
use crate::filter::{
    FilterBuilder, FilterCriteria, FilterOptions, NamespaceMatch, namespace_in_scope, present,
};
use crate::walker::PageWalker;

use super::source::TriggerSource;
use super::{Monitor, MonitorEvent};

/// Configuration of a [`ScheduleMonitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub name: String,
    pub interval: Duration,
    /// Namespace scope; children are included.
    pub namespace: Option<String>,
    pub flow_id: Option<String>,
    pub allowed_delay: Duration,
    pub max_execution_interval: Option<Duration>,
    pub max_execution_duration: Option<Duration>,
    /// Report disabled triggers instead of skipping them.
    pub include_disabled: bool,
}

impl ScheduleSettings {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            namespace: None,
            flow_id: None,
            allowed_delay: DEFAULT_ALLOWED_DELAY,
            max_execution_interval: None,
            max_execution_duration: None,
            include_disabled: false,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_flow_id(mut self, flow_id: impl Into<String>) -> Self {
        self.flow_id = Some(flow_id.into());
        self
    }

    fn rules(&self, now: DateTime<Utc>) -> ScheduleRules {
        ScheduleRules {
            now,
            allowed_delay: self.allowed_delay,
            max_execution_interval: self.max_execution_interval,
            max_execution_duration: self.max_execution_duration,
        }
    }
}

/// Monitor over every schedule trigger in scope.
pub struct ScheduleMonitor {
    settings: ScheduleSettings,
    source: Arc<dyn TriggerSource>,
}

impl ScheduleMonitor {
    pub fn new(settings: ScheduleSettings, source: Arc<dyn TriggerSource>) -> Self {
        Self { settings, source }
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Fill `running_since` for triggers with an execution in flight.
    ///
    /// Executions that no longer exist are ignored.
    async fn attach_running_since(&self, records: &mut [TriggerRecord]) -> Result<()> {
        for record in records.iter_mut() {
            let Some(execution_id) = record.running_execution_id.as_deref() else {
                continue;
            };
            match self.source.get_execution(execution_id).await {
                Ok(execution) => record.running_since = execution.running_since(),
                Err(EngineError::Transport(e)) if e.is_not_found() => {
                    tracing::debug!(
                        trigger = %record.qualified_id(),
                        execution_id,
                        "running execution not found"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Monitor for ScheduleMonitor {
    type Record = TriggerRecord;

    fn name(&self) -> &str {
        &self.settings.name
    }

    fn interval(&self) -> Duration {
        self.settings.interval
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<TriggerRecord>> {
        let criteria = FilterCriteria {
            namespace: self.settings.namespace.clone(),
            flow_id: self.settings.flow_id.clone(),
            ..FilterCriteria::default()
        };
        let filters = FilterBuilder::new(
            FilterOptions::default().with_namespace_match(NamespaceMatch::Prefix),
        )
        .build(&criteria, now)?;

        let request = PageRequest::all(LARGE_PAGE_SIZE)?;
        let walk = PageWalker::walk(&request, |page, size| {
            self.source.search_triggers(page, size, &filters)
        })
        .await?;

        let fetched = walk.records.len();
        // Same scope the server was asked for; a blank namespace means none
        let scope = present(&self.settings.namespace);
        let mut records: Vec<TriggerRecord> = walk
            .records
            .into_iter()
            .filter_map(|item| item.into_record())
            .filter(TriggerRecord::is_schedule)
            .filter(|r| scope.is_none_or(|s| namespace_in_scope(&r.namespace, s)))
            .collect();

        if self.settings.max_execution_duration.is_some() {
            self.attach_running_since(&mut records).await?;
        }

        tracing::debug!(
            monitor = %self.settings.name,
            fetched,
            schedules = records.len(),
            "fetched triggers"
        );
        Ok(records)
    }

    fn classify(&self, records: &[TriggerRecord], now: DateTime<Utc>) -> Option<MonitorEvent> {
        let rules = self.settings.rules(now);
        let triggers: Vec<DetectedTrigger> = records
            .iter()
            .filter_map(|record| {
                classify(record, &rules, self.settings.include_disabled).map(|verdict| {
                    tracing::info!(
                        trigger = %record.qualified_id(),
                        verdict = verdict.label(),
                        "unhealthy schedule"
                    );
                    DetectedTrigger {
                        trigger: record.clone(),
                        verdict,
                    }
                })
            })
            .collect();

        (!triggers.is_empty()).then_some(MonitorEvent::Schedules { triggers })
    }
}
