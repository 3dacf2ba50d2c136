//! Submission seam between coordinators and the aggregate.
//!
//! [`RecordSink`] abstracts over the two concurrency disciplines: direct
//! locked ingestion into the [`Aggregator`] and the single-writer funnel.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::aggregator::{Aggregator, SharedAggregator};
use crate::error::{Result, UnknownName};
use crate::funnel::{spawn_funnel, FunnelHandle};
use crate::types::LogRecord;

/// Destination for parsed records.
///
/// Implementors must apply each submitted record exactly once.
pub trait RecordSink: Send + Sync {
    /// Hands a record over for aggregation.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink can no longer accept records.
    fn submit(&self, record: LogRecord) -> impl Future<Output = Result<()>> + Send;
}

impl RecordSink for Aggregator {
    async fn submit(&self, record: LogRecord) -> Result<()> {
        self.ingest(record);
        Ok(())
    }
}

impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    fn submit(&self, record: LogRecord) -> impl Future<Output = Result<()>> + Send {
        T::submit(self, record)
    }
}

impl RecordSink for FunnelHandle {
    async fn submit(&self, record: LogRecord) -> Result<()> {
        Self::submit(self, record).await
    }
}

/// How records reach the aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Every coordinator ingests directly under the aggregate lock.
    #[default]
    Locked,
    /// Coordinators queue records for a single aggregation worker.
    Funnel,
}

impl IngestMode {
    /// Returns the configuration name of this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Funnel => "funnel",
        }
    }
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IngestMode {
    type Err = UnknownName;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "locked" | "lock" | "mutex" => Ok(Self::Locked),
            "funnel" | "queue" => Ok(Self::Funnel),
            _ => Err(UnknownName {
                kind: "ingest mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Runtime-selected sink, cloned into every coordinator.
#[derive(Debug, Clone)]
pub enum Sink {
    /// Direct locked ingestion.
    Locked(SharedAggregator),
    /// Queue to the aggregation worker.
    Funnel(FunnelHandle),
}

impl Sink {
    /// Builds the sink for `mode`.
    ///
    /// In funnel mode the worker is spawned on the current runtime and its
    /// handle returned; it finishes once every clone of the sink is dropped.
    ///
    /// # Panics
    ///
    /// Panics in funnel mode if called outside a Tokio runtime.
    #[must_use]
    pub fn start(
        mode: IngestMode,
        aggregator: SharedAggregator,
        funnel_capacity: usize,
    ) -> (Self, Option<JoinHandle<u64>>) {
        match mode {
            IngestMode::Locked => (Self::Locked(aggregator), None),
            IngestMode::Funnel => {
                let (handle, worker) = spawn_funnel(aggregator, funnel_capacity);
                (Self::Funnel(handle), Some(worker))
            }
        }
    }

    /// Returns the mode this sink implements.
    #[must_use]
    pub const fn mode(&self) -> IngestMode {
        match self {
            Self::Locked(_) => IngestMode::Locked,
            Self::Funnel(_) => IngestMode::Funnel,
        }
    }
}

impl RecordSink for Sink {
    async fn submit(&self, record: LogRecord) -> Result<()> {
        match self {
            Self::Locked(aggregator) => {
                aggregator.ingest(record);
                Ok(())
            }
            Self::Funnel(handle) => handle.submit(record).await,
        }
    }
}
