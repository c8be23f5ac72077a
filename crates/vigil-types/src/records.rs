//! Remote resources as seen by Vigil.
//!
//! Only the fields needed for filtering and health classification are typed;
//! everything else the server returns is kept in `extra` so stored output
//! stays faithful to the remote payload.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Triggers
// ─────────────────────────────────────────────────────────────────────────────

/// A trigger together with its scheduling context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRecord {
    pub namespace: String,
    pub flow_id: String,
    pub trigger_id: String,
    /// Fully qualified trigger type, when the server reports it.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub trigger_type: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_execution_time: Option<DateTime<Utc>>,
    /// Execution currently started by this trigger, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_execution_id: Option<String>,
    /// Start of the running execution, filled in when it has been looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_since: Option<DateTime<Utc>>,
    /// A backfill is in progress for this trigger.
    #[serde(default)]
    pub backfill: bool,
}

impl TriggerRecord {
    /// Create a record with no schedule information.
    pub fn new(
        namespace: impl Into<String>,
        flow_id: impl Into<String>,
        trigger_id: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            flow_id: flow_id.into(),
            trigger_id: trigger_id.into(),
            trigger_type: None,
            disabled: false,
            last_execution_time: None,
            next_execution_time: None,
            running_execution_id: None,
            running_since: None,
            backfill: false,
        }
    }

    /// Whether the trigger type names a cron schedule.
    ///
    /// Matches on the last dot-separated segment so that both old and new
    /// package layouts of the schedule trigger are recognised.
    pub fn is_schedule(&self) -> bool {
        self.trigger_type
            .as_deref()
            .and_then(|t| t.rsplit('.').next())
            .is_some_and(|name| name == "Schedule")
    }

    /// `namespace.flow_id.trigger_id`, for logs.
    pub fn qualified_id(&self) -> String {
        format!("{}.{}.{}", self.namespace, self.flow_id, self.trigger_id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Executions
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateType {
    Created,
    Submitted,
    Queued,
    Running,
    Paused,
    Restarted,
    Killing,
    Retrying,
    Breakpoint,
    Resubmitted,
    Success,
    Warning,
    Failed,
    Killed,
    Cancelled,
    Retried,
    Skipped,
    #[serde(other)]
    Unknown,
}

impl StateType {
    /// Whether the execution has reached a final state.
    pub fn is_terminated(&self) -> bool {
        matches!(
            self,
            StateType::Success
                | StateType::Warning
                | StateType::Failed
                | StateType::Killed
                | StateType::Cancelled
                | StateType::Retried
                | StateType::Skipped
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateType::Created => "CREATED",
            StateType::Submitted => "SUBMITTED",
            StateType::Queued => "QUEUED",
            StateType::Running => "RUNNING",
            StateType::Paused => "PAUSED",
            StateType::Restarted => "RESTARTED",
            StateType::Killing => "KILLING",
            StateType::Retrying => "RETRYING",
            StateType::Breakpoint => "BREAKPOINT",
            StateType::Resubmitted => "RESUBMITTED",
            StateType::Success => "SUCCESS",
            StateType::Warning => "WARNING",
            StateType::Failed => "FAILED",
            StateType::Killed => "KILLED",
            StateType::Cancelled => "CANCELLED",
            StateType::Retried => "RETRIED",
            StateType::Skipped => "SKIPPED",
            StateType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub current: StateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// An execution label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

/// A flow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub namespace: String,
    pub flow_id: String,
    pub state: ExecutionState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Execution {
    /// Start time if the execution is currently running.
    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        if self.state.current == StateType::Running {
            self.state.start_date
        } else {
            None
        }
    }
}

/// Which flows an execution query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowScope {
    User,
    System,
}

impl FlowScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowScope::User => "USER",
            FlowScope::System => "SYSTEM",
        }
    }
}

/// Restrict an execution query to parent or child executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildFilter {
    Child,
    Main,
}

impl ChildFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildFilter::Child => "CHILD",
            ChildFilter::Main => "MAIN",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logs
// ─────────────────────────────────────────────────────────────────────────────

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Namespaces
// ─────────────────────────────────────────────────────────────────────────────

/// A namespace entry from the namespace listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub id: String,
    #[serde(default)]
    pub disabled: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Assets
// ─────────────────────────────────────────────────────────────────────────────

/// A data asset tracked by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Asset {
    /// Create an asset with only the required fields.
    pub fn new(id: impl Into<String>, asset_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: None,
            asset_type: asset_type.into(),
            display_name: None,
            description: None,
            metadata: BTreeMap::new(),
            created: None,
            updated: None,
        }
    }
}
