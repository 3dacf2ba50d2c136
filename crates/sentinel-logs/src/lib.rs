//! # sentinel-logs
//!
//! Ingestion and live aggregation of line-oriented log records.
//!
//! This crate provides:
//!
//! - [`parse`] — Turns `YYYY-MM-DD HH:MM:SS LEVEL message` into a [`LogRecord`]
//! - [`classify`] — Maps a level token to its [`Severity`] class
//! - [`Aggregator`] — Lock-protected records plus per-level and per-severity counts
//! - [`spawn_funnel`] — Single-writer alternative: bounded queue, one worker
//! - [`Coordinator`] — Drives one connection's lines into a [`RecordSink`]
//! - [`line_source`] — Newline framing over any async byte stream
//!
//! ## Example
//!
//! ```rust
//! use futures::stream;
//! use sentinel_logs::{shared_aggregator, Coordinator, Severity};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let aggregator = shared_aggregator();
//! let coordinator = Coordinator::new("docs", aggregator.clone());
//!
//! let lines = stream::iter(vec![
//!     Ok::<_, std::io::Error>("2026-01-08 10:24:10 ERROR Database connection failed".to_string()),
//!     Ok("not a log line".to_string()),
//! ]);
//! let summary = coordinator.handle(lines, |_, _| {}).await;
//!
//! assert_eq!(summary.accepted, 1);
//! assert_eq!(summary.rejected, 1);
//! assert_eq!(aggregator.severity_count(Severity::Critical), 1);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod coordinator;
pub mod error;
pub mod funnel;
pub mod parser;
pub mod sink;
pub mod source;
pub mod types;

// Re-export main types
pub use aggregator::{shared_aggregator, Aggregator, SharedAggregator};
pub use coordinator::{log_rejection, ConnectionSummary, Coordinator, Termination};
pub use error::{IngestError, LineError, ParseError, Result, UnknownName};
pub use funnel::{spawn_funnel, FunnelHandle, DEFAULT_FUNNEL_CAPACITY};
pub use parser::parse;
pub use sink::{IngestMode, RecordSink, Sink};
pub use source::{line_source, DEFAULT_MAX_LINE_LENGTH};
pub use types::{classify, AggregateSnapshot, Counts, LogRecord, Severity, WIRE_TIMESTAMP_FORMAT};
