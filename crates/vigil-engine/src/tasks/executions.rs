//! Execution queries and actions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_client::{DeleteExecutionOptions, VigilClient};
use vigil_types::{Execution, PageRequest, SMALL_PAGE_SIZE};

use crate::error::{EngineError, Result};
use crate::filter::{FilterBuilder, FilterCriteria, FilterOptions, MultiValue, NamespaceMatch};
use crate::projector::{FetchMode, Projection, project};
use crate::sink::RecordSink;
use crate::walker::PageWalker;

use super::require;

fn filter_builder() -> FilterBuilder {
    FilterBuilder::new(
        FilterOptions::default()
            .with_namespace_match(NamespaceMatch::Exact)
            .with_multi_value(MultiValue::PerValue),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────────────────────────────────

/// Search executions and project the result.
#[derive(Debug, Clone)]
pub struct ExecutionQuery {
    pub criteria: FilterCriteria,
    /// Fetch only this page; `None` walks every page.
    pub page: Option<u32>,
    pub size: u32,
    pub fetch_mode: FetchMode,
}

impl Default for ExecutionQuery {
    fn default() -> Self {
        Self {
            criteria: FilterCriteria::default(),
            page: None,
            size: SMALL_PAGE_SIZE,
            fetch_mode: FetchMode::Store,
        }
    }
}

pub async fn query(
    client: &VigilClient,
    request: &ExecutionQuery,
    now: DateTime<Utc>,
    sink: &mut dyn RecordSink,
) -> Result<Projection<Execution>> {
    let page = PageRequest::new(request.page, request.size)?;
    let filters = filter_builder().build(&request.criteria, now)?;

    let api = client.executions();
    let walk = PageWalker::walk(&page, |page, size| api.search(page, size, &filters)).await?;

    tracing::info!(found = walk.records.len(), total = walk.total, "queried executions");
    project(walk.records, request.fetch_mode, sink).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Count
// ─────────────────────────────────────────────────────────────────────────────

/// Condition the count must satisfy to be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountExpectation {
    Eq(u64),
    Gte(u64),
    Lte(u64),
}

impl CountExpectation {
    pub fn holds(&self, count: u64) -> bool {
        match *self {
            CountExpectation::Eq(n) => count == n,
            CountExpectation::Gte(n) => count >= n,
            CountExpectation::Lte(n) => count <= n,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CountRequest {
    pub criteria: FilterCriteria,
    pub expect: Option<CountExpectation>,
}

/// Count matching executions.
///
/// Only the total of a one-row page is read. When an expectation is given
/// and does not hold, the count is reported as zero.
pub async fn count(
    client: &VigilClient,
    request: &CountRequest,
    now: DateTime<Utc>,
) -> Result<u64> {
    let filters = filter_builder().build(&request.criteria, now)?;
    let page = client.executions().search(1, 1, &filters).await?;

    let total = match request.expect {
        Some(expect) if !expect.holds(page.total) => {
            tracing::debug!(total = page.total, ?expect, "count expectation not met");
            0
        }
        _ => page.total,
    };
    Ok(total)
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

/// Kill an execution; `propagate` also kills its sub-executions.
pub async fn kill(client: &VigilClient, execution_id: &str, propagate: bool) -> Result<()> {
    let id = require(execution_id, "execution id")?;
    client
        .executions()
        .kill(id, propagate)
        .await
        .map_err(|e| EngineError::not_found_as(e, format!("execution {id}")))?;
    tracing::info!(execution_id = id, propagate, "killed execution");
    Ok(())
}

/// Resume a paused execution.
pub async fn resume(
    client: &VigilClient,
    execution_id: &str,
    inputs: &BTreeMap<String, serde_json::Value>,
) -> Result<()> {
    let id = require(execution_id, "execution id")?;
    client
        .executions()
        .resume(id, inputs)
        .await
        .map_err(|e| EngineError::not_found_as(e, format!("execution {id}")))?;
    tracing::info!(execution_id = id, inputs = inputs.len(), "resumed execution");
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    pub execution_id: String,
    /// Execution the caller runs in, if any; it may not delete itself.
    pub current_execution_id: Option<String>,
    pub options: DeleteExecutionOptions,
}

/// Delete a terminated execution.
pub async fn delete(client: &VigilClient, request: &DeleteRequest) -> Result<()> {
    let id = require(&request.execution_id, "execution id")?;
    if request.current_execution_id.as_deref().map(str::trim) == Some(id) {
        return Err(EngineError::Unsupported(
            "an execution cannot delete itself".to_string(),
        ));
    }

    let execution = client
        .executions()
        .get(id)
        .await
        .map_err(|e| EngineError::not_found_as(e, format!("execution {id}")))?;

    let state = execution.state.current;
    if !state.is_terminated() {
        return Err(EngineError::NotTerminated {
            id: id.to_string(),
            state,
        });
    }

    client.executions().delete(id, request.options).await?;
    tracing::info!(
        execution_id = id,
        delete_logs = request.options.delete_logs,
        delete_metrics = request.options.delete_metrics,
        delete_storage = request.options.delete_storage,
        "deleted execution"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::client_for;
    use crate::sink::JsonLinesSink;
    use chrono::TimeZone;
    use serde_json::json;
    use vigil_types::{Label, StateType};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn execution(id: &str, state: &str) -> serde_json::Value {
        json!({"id": id, "namespace": "company", "flowId": "etl", "state": {"current": state}})
    }

    #[tokio::test]
    async fn test_query_walks_pages_and_fetches_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/main/executions/search"))
            .and(query_param("page", "1"))
            .and(query_param("filters[namespace][EQUALS]", "company"))
            .and(query_param("filters[labels][EQUALS]", "team:data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [execution("a", "SUCCESS"), execution("b", "FAILED")],
                "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/main/executions/search"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [execution("c", "RUNNING")],
                "total": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = ExecutionQuery {
            criteria: FilterCriteria {
                namespace: Some("company".to_string()),
                labels: vec![Label {
                    key: "team".to_string(),
                    value: "data".to_string(),
                }],
                ..FilterCriteria::default()
            },
            size: 2,
            fetch_mode: FetchMode::Fetch,
            ..ExecutionQuery::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonLinesSink::new(dir.path(), "executions");

        let projection = query(&client_for(&server), &request, now(), &mut sink)
            .await
            .unwrap();

        assert_eq!(projection.size, 3);
        let ids: Vec<_> = projection.rows.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(sink.written(), 0);
    }

    #[tokio::test]
    async fn test_query_rejects_bad_range_before_network() {
        let server = MockServer::start().await;
        let request = ExecutionQuery {
            criteria: FilterCriteria {
                start_date: Some(now()),
                time_range: Some(std::time::Duration::from_secs(3600)),
                ..FilterCriteria::default()
            },
            ..ExecutionQuery::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonLinesSink::new(dir.path(), "executions");

        let result = query(&client_for(&server), &request, now(), &mut sink).await;

        assert!(matches!(result, Err(EngineError::InvalidFilterCombination(_))));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_reads_single_row_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/main/executions/search"))
            .and(query_param("page", "1"))
            .and(query_param("size", "1"))
            .and(query_param("filters[state][EQUALS]", "FAILED"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [execution("a", "FAILED")],
                "total": 42
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut request = CountRequest {
            criteria: FilterCriteria {
                states: vec![StateType::Failed],
                ..FilterCriteria::default()
            },
            expect: None,
        };
        assert_eq!(count(&client, &request, now()).await.unwrap(), 42);

        request.expect = Some(CountExpectation::Gte(40));
        assert_eq!(count(&client, &request, now()).await.unwrap(), 42);

        request.expect = Some(CountExpectation::Lte(10));
        assert_eq!(count(&client, &request, now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_refuses_running_execution() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/main/executions/exec-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(execution("exec-1", "RUNNING")))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let request = DeleteRequest {
            execution_id: "exec-1".to_string(),
            ..DeleteRequest::default()
        };
        let err = delete(&client_for(&server), &request).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::NotTerminated { ref id, state: StateType::Running } if id == "exec-1"
        ));
    }

    #[tokio::test]
    async fn test_delete_terminated_execution() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/main/executions/exec-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(execution("exec-1", "KILLED")))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/main/executions/exec-1"))
            .and(query_param("deleteLogs", "false"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let request = DeleteRequest {
            execution_id: "exec-1".to_string(),
            current_execution_id: Some("exec-2".to_string()),
            options: DeleteExecutionOptions {
                delete_logs: false,
                ..DeleteExecutionOptions::default()
            },
        };
        delete(&client_for(&server), &request).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_and_self() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/main/executions/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such execution"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        let missing = DeleteRequest {
            execution_id: "gone".to_string(),
            ..DeleteRequest::default()
        };
        assert!(matches!(
            delete(&client, &missing).await,
            Err(EngineError::NotFound(_))
        ));

        let own = DeleteRequest {
            execution_id: "self".to_string(),
            current_execution_id: Some("self".to_string()),
            ..DeleteRequest::default()
        };
        assert!(matches!(
            delete(&client, &own).await,
            Err(EngineError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_kill_requires_id() {
        let server = MockServer::start().await;
        let result = kill(&client_for(&server), "  ", true).await;
        assert!(matches!(result, Err(EngineError::EmptyRequiredValue(_))));
    }
}
