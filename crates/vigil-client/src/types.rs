//! Request and response types for the orchestration API.
//!
//! Records shared with the engine live in `vigil-types`; this module only
//! holds the shapes that are specific to individual endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_types::TriggerRecord;

// ─────────────────────────────────────────────────────────────────────────────
// Triggers
// ─────────────────────────────────────────────────────────────────────────────

/// Trigger definition as declared in the flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub trigger_type: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

/// Runtime scheduling state of a trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerContext {
    pub namespace: String,
    pub flow_id: String,
    pub trigger_id: String,
    /// Last evaluation / execution date.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_execution_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
    /// Present while a backfill runs; its content is not inspected.
    #[serde(default)]
    pub backfill: Option<serde_json::Value>,
}

/// One entry of the trigger search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSearchItem {
    #[serde(default)]
    pub abstract_trigger: Option<TriggerDefinition>,
    #[serde(default)]
    pub trigger_context: Option<TriggerContext>,
}

impl TriggerSearchItem {
    /// Flatten into a [`TriggerRecord`].
    ///
    /// Returns `None` when the trigger has never been evaluated and therefore
    /// carries no scheduling context. A trigger is disabled when either its
    /// definition or its runtime context says so.
    pub fn into_record(self) -> Option<TriggerRecord> {
        let context = self.trigger_context?;
        let definition = self.abstract_trigger.unwrap_or_default();

        let disabled =
            definition.disabled.unwrap_or(false) || context.disabled.unwrap_or(false);

        Some(TriggerRecord {
            namespace: context.namespace,
            flow_id: context.flow_id,
            trigger_id: context.trigger_id,
            trigger_type: definition.trigger_type,
            disabled,
            last_execution_time: context.date,
            next_execution_time: context.next_execution_date,
            running_execution_id: context.execution_id,
            running_since: None,
            backfill: context.backfill.is_some_and(|b| !b.is_null()),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bulk operations
// ─────────────────────────────────────────────────────────────────────────────

/// Number of resources affected by a by-query operation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CountResponse {
    #[serde(default)]
    pub count: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Executions
// ─────────────────────────────────────────────────────────────────────────────

/// Flags controlling what is removed along with an execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteExecutionOptions {
    pub delete_logs: bool,
    pub delete_metrics: bool,
    pub delete_storage: bool,
}

impl Default for DeleteExecutionOptions {
    fn default() -> Self {
        Self {
            delete_logs: true,
            delete_metrics: true,
            delete_storage: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test suites
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a test suite run; an empty list runs every test case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTestSuiteRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_cases: Vec<String>,
}

/// Outcome of a test suite or of one of its test cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestState {
    Success,
    Failed,
    Error,
    Skipped,
}

impl TestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestState::Success => "SUCCESS",
            TestState::Failed => "FAILED",
            TestState::Error => "ERROR",
            TestState::Skipped => "SKIPPED",
        }
    }
}

impl std::fmt::Display for TestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub expected: Option<serde_json::Value>,
    #[serde(default)]
    pub actual: Option<serde_json::Value>,
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseError {
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Result of one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub test_id: String,
    pub state: TestState,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub assertion_results: Vec<AssertionResult>,
    #[serde(default)]
    pub errors: Vec<TestCaseError>,
}

/// Result of a whole test suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteRunResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub test_suite_id: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub flow_id: Option<String>,
    pub state: TestState,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Vec<TestCaseResult>,
}
