//! Local filesystem result sink.
//!
//! ## Output layout
//!
//! - Success file: CSV, append-only within and across runs, header written
//!   once. Append keeps a partially processed input resumable: rerunning
//!   against the same file continues where the previous run stopped.
//! - Failure file: JSON array rewritten in full on each flush, merged with
//!   whatever a prior run left there. Read-modify-write, so it must never
//!   have concurrent writers.

use std::fs::OpenOptions;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{FailureRecord, OutputConfig, SuccessRecord};
use crate::storage::ResultSink;

/// File-backed result sink.
pub struct LocalSink {
    success_path: PathBuf,
    failure_path: PathBuf,
    output: OutputConfig,
    header_written: bool,
}

impl LocalSink {
    /// Create a sink over the given output files. An existing non-empty
    /// success file means a resumed run; its header is not repeated.
    pub fn new(
        success_path: impl Into<PathBuf>,
        failure_path: impl Into<PathBuf>,
        output: OutputConfig,
    ) -> Self {
        let success_path = success_path.into();
        let header_written = std::fs::metadata(&success_path)
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        Self {
            success_path,
            failure_path: failure_path.into(),
            output,
            header_written,
        }
    }

    /// Render a numeric field honoring the configured decimal separator.
    fn format_float(&self, value: f64) -> String {
        let rendered = value.to_string();
        if self.output.decimal_comma {
            rendered.replace('.', ",")
        } else {
            rendered
        }
    }

    fn success_record_fields(&self, row: &SuccessRecord) -> [String; 7] {
        [
            row.id.clone(),
            row.address.clone(),
            row.porch.clone(),
            self.format_float(row.lat),
            self.format_float(row.lon),
            row.azimuth.map(|a| self.format_float(a)).unwrap_or_default(),
            row.source.clone(),
        ]
    }

    /// Load the accumulated failure document, empty when absent.
    async fn load_failures(&self) -> Result<Vec<FailureRecord>> {
        match tokio::fs::read(&self.failure_path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_failures(&self, records: &[FailureRecord]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.failure_path.with_extension("tmp");

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.failure_path).await?;
        Ok(())
    }
}

#[async_trait]
impl ResultSink for LocalSink {
    async fn record_successes(&mut self, rows: &[SuccessRecord]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.success_path)?;
        let mut writer = csv::Writer::from_writer(file);

        if !self.header_written {
            writer.write_record(["id", "address", "porch", "lat", "lon", "azimuth", "source"])?;
            self.header_written = true;
        }
        for row in rows {
            writer.write_record(self.success_record_fields(row))?;
        }
        writer.flush()?;
        Ok(())
    }

    async fn record_failures(&mut self, rows: &[FailureRecord]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut accumulated = self.load_failures().await?;
        accumulated.extend(rows.iter().cloned());
        self.write_failures(&accumulated).await
    }
}
