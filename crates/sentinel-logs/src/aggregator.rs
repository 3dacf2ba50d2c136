//! Shared aggregate state.
//!
//! This module provides:
//! - [`Aggregator`] — Sole owner of the records and running counts
//! - [`SharedAggregator`] — Handle passed to every coordinator
//!
//! All three containers sit behind one [`RwLock`], so an ingest is observed
//! either entirely or not at all.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::types::{AggregateSnapshot, Counts, LogRecord, Severity};

#[derive(Debug, Default)]
struct AggregateState {
    records: Vec<Arc<LogRecord>>,
    level_counts: Counts<String>,
    severity_counts: Counts<Severity>,
}

/// Thread-safe aggregate of every ingested record.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: RwLock<AggregateState>,
}

impl Aggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record and updates both counters as one atomic step.
    pub fn ingest(&self, record: LogRecord) {
        let severity = record.severity();
        let record = Arc::new(record);

        let mut state = self.state.write();
        state.level_counts.increment(record.level.as_str());
        state.severity_counts.increment(&severity);
        state.records.push(Arc::clone(&record));
        let total = state.records.len();
        drop(state);

        trace!(level = %record.level, %severity, total, "record ingested");
    }

    /// Returns a consistent copy of the records and counts.
    ///
    /// The read lock is held only while record pointers and the count maps
    /// are copied; record bodies are cloned after it is released.
    #[must_use]
    pub fn snapshot(&self) -> AggregateSnapshot {
        let (records, level_counts, severity_counts) = {
            let state = self.state.read();
            (
                state.records.clone(),
                state.level_counts.clone(),
                state.severity_counts.clone(),
            )
        };

        AggregateSnapshot {
            records: records.iter().map(|r| LogRecord::clone(r)).collect(),
            level_counts,
            severity_counts,
        }
    }

    /// Returns the level and severity counts without copying records.
    #[must_use]
    pub fn counts(&self) -> (Counts<String>, Counts<Severity>) {
        let state = self.state.read();
        (state.level_counts.clone(), state.severity_counts.clone())
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    /// Returns true if nothing has been ingested.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Returns the count for a level token.
    #[must_use]
    pub fn level_count(&self, level: &str) -> u64 {
        self.state.read().level_counts.get(level)
    }

    /// Returns the count for a severity class.
    #[must_use]
    pub fn severity_count(&self, severity: Severity) -> u64 {
        self.state.read().severity_counts.get(&severity)
    }
}

/// Shared aggregator handle.
pub type SharedAggregator = Arc<Aggregator>;

/// Creates a new shared aggregator.
#[must_use]
pub fn shared_aggregator() -> SharedAggregator {
    Arc::new(Aggregator::new())
}
