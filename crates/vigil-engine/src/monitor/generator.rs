//! Turning monitor events into executions.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{EngineError, Result};
use crate::monitor::MonitorEvent;

/// Identifies the tick that produced an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    pub monitor: String,
    /// 1-based tick counter of the runner.
    pub tick: u64,
    pub evaluated_at: DateTime<Utc>,
}

/// Reference to the execution started for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionHandle {
    pub id: String,
    pub monitor: String,
    pub emitted_at: DateTime<Utc>,
    /// Number of records carried by the event.
    pub records: usize,
}

/// Materializes one execution per monitor event.
#[async_trait]
pub trait ExecutionGenerator: Send + Sync {
    async fn generate(
        &self,
        context: &EvaluationContext,
        event: &MonitorEvent,
    ) -> Result<ExecutionHandle>;
}

/// Records events through `tracing` and, optionally, as JSON lines in a file.
pub struct LogGenerator {
    output: Option<PathBuf>,
    file_lock: Mutex<()>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventLine<'a> {
    execution_id: &'a str,
    context: &'a EvaluationContext,
    event: &'a MonitorEvent,
}

impl LogGenerator {
    pub fn new() -> Self {
        Self {
            output: None,
            file_lock: Mutex::new(()),
        }
    }

    /// Also append every event to `path`.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    async fn append(&self, path: &Path, line: &EventLine<'_>) -> Result<()> {
        let mut bytes = serde_json::to_vec(line).map_err(|e| EngineError::Emit(e.to_string()))?;
        bytes.push(b'\n');

        let _guard = self.file_lock.lock().await;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EngineError::Emit(format!("{}: {}", parent.display(), e)))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| EngineError::Emit(format!("{}: {}", path.display(), e)))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| EngineError::Emit(format!("{}: {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| EngineError::Emit(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }
}

impl Default for LogGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionGenerator for LogGenerator {
    async fn generate(
        &self,
        context: &EvaluationContext,
        event: &MonitorEvent,
    ) -> Result<ExecutionHandle> {
        let id = uuid::Uuid::new_v4().to_string();

        if let Some(path) = &self.output {
            let line = EventLine {
                execution_id: &id,
                context,
                event,
            };
            self.append(path, &line).await?;
        }

        tracing::info!(
            monitor = %context.monitor,
            execution_id = %id,
            kind = event.kind(),
            records = event.len(),
            "monitor event emitted"
        );

        Ok(ExecutionHandle {
            id,
            monitor: context.monitor.clone(),
            emitted_at: context.evaluated_at,
            records: event.len(),
        })
    }
}
