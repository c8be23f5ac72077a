//! Shapes walked records into a task output.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::sink::RecordSink;

/// How a task hands its records back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchMode {
    /// Return every record inline.
    Fetch,
    /// Return the first record only.
    FetchOne,
    /// Write records through a sink and return its URI.
    #[default]
    Store,
    /// Return the count only.
    None,
}

/// Task output. Which fields are set depends on the [`FetchMode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection<T> {
    /// Number of records represented by this output.
    pub size: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl<T> Projection<T> {
    fn count_only(size: u64) -> Self {
        Self {
            size,
            rows: Vec::new(),
            row: None,
            uri: None,
        }
    }
}

/// Project records according to `mode`.
///
/// The sink is only touched in [`FetchMode::Store`] and only when there is at
/// least one record; an empty store yields no URI.
pub async fn project<T: Serialize>(
    records: Vec<T>,
    mode: FetchMode,
    sink: &mut dyn RecordSink,
) -> Result<Projection<T>> {
    let size = records.len() as u64;

    match mode {
        FetchMode::Fetch => Ok(Projection {
            rows: records,
            ..Projection::count_only(size)
        }),
        FetchMode::FetchOne => {
            let row = records.into_iter().next();
            Ok(Projection {
                size: u64::from(row.is_some()),
                row,
                ..Projection::count_only(0)
            })
        }
        FetchMode::Store => {
            if records.is_empty() {
                return Ok(Projection::count_only(0));
            }
            for record in &records {
                let value =
                    serde_json::to_value(record).map_err(|e| EngineError::Sink(e.to_string()))?;
                sink.write(&value).await?;
            }
            let uri = sink.finish().await?;
            Ok(Projection {
                uri: Some(uri),
                ..Projection::count_only(size)
            })
        }
        FetchMode::None => Ok(Projection::count_only(size)),
    }
}
