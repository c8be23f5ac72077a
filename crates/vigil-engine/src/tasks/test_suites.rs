//! Run a test suite and turn its outcome into a task state.

use serde::Serialize;
use vigil_client::{
    AssertionResult, RunTestSuiteRequest, TestCaseResult, TestState, TestSuiteRunResult,
    VigilClient,
};
use vigil_types::StateType;

use crate::error::Result;

use super::require;

#[derive(Debug, Clone, Default)]
pub struct TestSuiteRun {
    pub namespace: String,
    pub test_id: String,
    /// Empty runs every test case of the suite.
    pub test_cases: Vec<String>,
    /// Report failed test cases as `FAILED` instead of `WARNING`.
    pub fail_on_test_failure: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteOutcome {
    pub result: TestSuiteRunResult,
    /// Final state of the calling task; `None` leaves it successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_override: Option<StateType>,
}

/// State a caller should end in for a suite that finished in `state`.
///
/// Errors always fail. Failures warn unless `fail_on_test_failure` is set.
/// A skipped suite warns.
pub fn state_override(state: TestState, fail_on_test_failure: bool) -> Option<StateType> {
    match state {
        TestState::Success => None,
        TestState::Error => Some(StateType::Failed),
        TestState::Failed if fail_on_test_failure => Some(StateType::Failed),
        TestState::Failed | TestState::Skipped => Some(StateType::Warning),
    }
}

pub async fn run(client: &VigilClient, request: &TestSuiteRun) -> Result<TestSuiteOutcome> {
    let namespace = require(&request.namespace, "namespace")?;
    let test_id = require(&request.test_id, "test id")?;
    let suite = format!("{namespace}.{test_id}");

    let body = RunTestSuiteRequest {
        test_cases: request
            .test_cases
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
    };

    tracing::info!(%suite, cases = body.test_cases.len(), "running test suite");
    let result = client.test_suites().run(namespace, test_id, &body).await?;

    for case in &result.results {
        log_case(&suite, case);
    }

    match result.state {
        TestState::Success => tracing::info!(%suite, "test suite passed"),
        TestState::Error => tracing::error!(%suite, "test suite ended with ERROR"),
        state => tracing::warn!(%suite, %state, "test suite did not pass"),
    }

    Ok(TestSuiteOutcome {
        state_override: state_override(result.state, request.fail_on_test_failure),
        result,
    })
}

fn log_case(suite: &str, case: &TestCaseResult) {
    let execution_id = case.execution_id.as_deref().unwrap_or("-");
    let url = case.url.as_deref().unwrap_or("-");

    if case.state == TestState::Error {
        let errors: Vec<String> = case
            .errors
            .iter()
            .map(|e| match &e.details {
                Some(details) => format!("{}, details: {}", e.message, details),
                None => e.message.clone(),
            })
            .collect();
        tracing::error!(
            suite,
            case = %case.test_id,
            state = %case.state,
            execution_id,
            url,
            errors = %errors.join("\n"),
            "test case errored"
        );
    } else {
        tracing::info!(
            suite,
            case = %case.test_id,
            state = %case.state,
            execution_id,
            url,
            "test case finished"
        );
    }

    for assertion in &case.assertion_results {
        tracing::debug!(suite, case = %case.test_id, "{}", describe_assertion(assertion));
    }
}

fn describe_assertion(assertion: &AssertionResult) -> String {
    let status = if assertion.is_success { "SUCCESS" } else { "FAILED" };
    let show = |value: &Option<serde_json::Value>| {
        value.as_ref().map_or_else(|| "null".to_string(), |v| v.to_string())
    };
    let mut text = format!(
        "assertion {status}: expected {} {} {}",
        show(&assertion.expected),
        assertion.operator.as_deref().unwrap_or("?"),
        show(&assertion.actual),
    );
    if let Some(description) = &assertion.description {
        text.push_str(&format!("; description: {description}"));
    }
    if let Some(message) = &assertion.error_message {
        text.push_str(&format!("; error message: {message}"));
    }
    text
}
