//! Single-writer aggregation funnel.
//!
//! Coordinators push records into a bounded queue; one worker task drains it
//! and applies each record to the [`Aggregator`](crate::aggregator::Aggregator)
//! in queue order. A full queue blocks the submitter instead of dropping.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::aggregator::SharedAggregator;
use crate::error::{IngestError, Result};
use crate::types::LogRecord;

/// Default queue capacity.
pub const DEFAULT_FUNNEL_CAPACITY: usize = 100;

/// Submission side of the funnel. Cheap to clone, one per coordinator.
#[derive(Debug, Clone)]
pub struct FunnelHandle {
    sender: mpsc::Sender<LogRecord>,
}

impl FunnelHandle {
    /// Queues a record, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Closed`] if the worker has stopped.
    pub async fn submit(&self, record: LogRecord) -> Result<()> {
        self.sender
            .send(record)
            .await
            .map_err(|_| IngestError::Closed)
    }

    /// Returns the number of free slots in the queue.
    #[must_use]
    pub fn available(&self) -> usize {
        self.sender.capacity()
    }
}

/// Starts the aggregation worker.
///
/// The worker runs until every [`FunnelHandle`] clone is dropped and the
/// queue is drained, then resolves to the number of records it applied.
/// A `capacity` of zero is treated as one.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn spawn_funnel(
    aggregator: SharedAggregator,
    capacity: usize,
) -> (FunnelHandle, JoinHandle<u64>) {
    let (sender, mut receiver) = mpsc::channel::<LogRecord>(capacity.max(1));

    let worker = tokio::spawn(async move {
        let mut applied = 0u64;
        while let Some(record) = receiver.recv().await {
            aggregator.ingest(record);
            applied += 1;
        }
        debug!(applied, "aggregation funnel drained");
        applied
    });

    (FunnelHandle { sender }, worker)
}
