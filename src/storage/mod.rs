//! Result persistence.
//!
//! Successes are appended to a delimited file, failures accumulate in a JSON
//! document merged across runs. Both sinks flush on every call: durability
//! over batching, because long runs get interrupted.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FailureRecord, SuccessRecord};

// Re-export for convenience
pub use local::LocalSink;

/// Sink for per-address outcomes.
///
/// Single-writer: a sink instance (and its files) belongs to exactly one
/// run at a time.
#[async_trait]
pub trait ResultSink: Send {
    /// Append success rows and flush. The header is written lazily on the
    /// first success of the first run against the target file.
    async fn record_successes(&mut self, rows: &[SuccessRecord]) -> Result<()>;

    /// Merge failure rows into the accumulated failure document and flush.
    /// Pre-existing content from prior runs is preserved, never truncated.
    async fn record_failures(&mut self, rows: &[FailureRecord]) -> Result<()>;
}
