//! Destinations for stored query results.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

use crate::error::{EngineError, Result};

/// Receives records one at a time and yields a URI once finished.
#[async_trait]
pub trait RecordSink: Send {
    /// Append one record.
    async fn write(&mut self, record: &serde_json::Value) -> Result<()>;

    /// Flush everything written so far and return where it lives.
    async fn finish(&mut self) -> Result<String>;
}

/// Writes newline-delimited JSON to a file under a directory.
///
/// The file is only created on the first write, so a sink that never
/// receives a record leaves no trace on disk.
pub struct JsonLinesSink {
    dir: PathBuf,
    prefix: String,
    writer: Option<(PathBuf, BufWriter<File>)>,
    written: u64,
}

impl JsonLinesSink {
    /// Files are named `<prefix>-<uuid>.jsonl`.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            writer: None,
            written: 0,
        }
    }

    /// Number of records written.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path of the output file, once created.
    pub fn path(&self) -> Option<&Path> {
        self.writer.as_ref().map(|(path, _)| path.as_path())
    }

    async fn open(&mut self) -> Result<&mut BufWriter<File>> {
        if self.writer.is_none() {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| sink_error(&self.dir, e))?;
            let dir = std::path::absolute(&self.dir).map_err(|e| sink_error(&self.dir, e))?;
            let path = dir.join(format!("{}-{}.jsonl", self.prefix, uuid::Uuid::new_v4()));
            let file = File::create(&path)
                .await
                .map_err(|e| sink_error(&path, e))?;
            tracing::debug!(path = %path.display(), "opened result file");
            self.writer = Some((path, BufWriter::new(file)));
        }
        match self.writer.as_mut() {
            Some((_, writer)) => Ok(writer),
            None => Err(EngineError::Sink("result file not open".to_string())),
        }
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn write(&mut self, record: &serde_json::Value) -> Result<()> {
        let mut line =
            serde_json::to_vec(record).map_err(|e| EngineError::Sink(e.to_string()))?;
        line.push(b'\n');

        let writer = self.open().await?;
        writer
            .write_all(&line)
            .await
            .map_err(|e| EngineError::Sink(e.to_string()))?;
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<String> {
        let Some((path, writer)) = self.writer.as_mut() else {
            return Err(EngineError::Sink("no records were written".to_string()));
        };
        writer.flush().await.map_err(|e| sink_error(path, e))?;

        let uri = Url::from_file_path(&*path)
            .map_err(|()| EngineError::Sink(format!("not a file path: {}", path.display())))?;
        tracing::info!(uri = %uri, records = self.written, "stored results");
        Ok(uri.to_string())
    }
}

fn sink_error(path: &Path, err: std::io::Error) -> EngineError {
    EngineError::Sink(format!("{}: {}", path.display(), err))
}
