//! Per-connection ingestion driver.
//!
//! A [`Coordinator`] owns one line source: it parses every line, reports
//! rejects through a hook and submits the rest to a shared [`RecordSink`].
//! Whatever happens to its source, it only ever ends its own loop.

use std::fmt;

use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::parser::parse;
use crate::sink::RecordSink;

/// Why a coordinator stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum Termination {
    /// The source signalled end of stream.
    EndOfStream,
    /// The source failed mid-stream.
    ReadFault(String),
    /// The sink stopped accepting records.
    SinkClosed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfStream => f.write_str("end of stream"),
            Self::ReadFault(e) => write!(f, "read fault: {e}"),
            Self::SinkClosed => f.write_str("sink closed"),
        }
    }
}

/// Outcome of one coordinator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    /// Label of the source, usually the peer address.
    pub source: String,
    /// Lines parsed and submitted.
    pub accepted: u64,
    /// Lines dropped by the parser.
    pub rejected: u64,
    /// Why the loop ended.
    pub termination: Termination,
}

/// Drives one line source into a sink.
#[derive(Debug)]
pub struct Coordinator<S> {
    source: String,
    sink: S,
}

impl<S: RecordSink> Coordinator<S> {
    /// Creates a coordinator for the source labelled `source`.
    #[must_use]
    pub fn new(source: impl Into<String>, sink: S) -> Self {
        Self {
            source: source.into(),
            sink,
        }
    }

    /// Returns the source label.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Consumes `lines` until it ends or fails.
    ///
    /// Lines the parser rejects go to `on_reject` and are dropped; every
    /// other line is submitted to the sink before the next one is read.
    pub async fn handle<L, E, F>(self, lines: L, mut on_reject: F) -> ConnectionSummary
    where
        L: Stream<Item = Result<String, E>>,
        E: fmt::Display,
        F: FnMut(&str, &ParseError),
    {
        let mut lines = std::pin::pin!(lines);
        let mut accepted = 0u64;
        let mut rejected = 0u64;

        let termination = loop {
            let line = match lines.next().await {
                None => break Termination::EndOfStream,
                Some(Err(e)) => break Termination::ReadFault(e.to_string()),
                Some(Ok(line)) => line,
            };

            match parse(&line) {
                Ok(record) => {
                    if self.sink.submit(record).await.is_err() {
                        break Termination::SinkClosed;
                    }
                    accepted += 1;
                }
                Err(e) => {
                    rejected += 1;
                    on_reject(&line, &e);
                }
            }
        };

        debug!(
            source = %self.source,
            accepted,
            rejected,
            %termination,
            "line source finished"
        );

        ConnectionSummary {
            source: self.source,
            accepted,
            rejected,
            termination,
        }
    }
}

/// Builds the default reject hook: a warning carrying the line and reason.
pub fn log_rejection(source: &str) -> impl FnMut(&str, &ParseError) + '_ {
    move |line, error| {
        warn!(source, line, %error, "dropping unparseable line");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::shared_aggregator;
    use crate::error::IngestError;
    use crate::types::{LogRecord, Severity};
    use futures::stream;
    use std::sync::Arc;

    fn ok_lines(lines: &[&str]) -> Vec<Result<String, std::io::Error>> {
        lines.iter().map(|l| Ok((*l).to_string())).collect()
    }

    struct ClosedSink;

    impl RecordSink for ClosedSink {
        async fn submit(&self, _record: LogRecord) -> crate::error::Result<()> {
            Err(IngestError::Closed)
        }
    }

    #[tokio::test]
    async fn submits_parsed_lines_and_reports_rejects() {
        let aggregator = shared_aggregator();
        let coordinator = Coordinator::new("test", Arc::clone(&aggregator));

        let mut rejects = Vec::new();
        let summary = coordinator
            .handle(
                stream::iter(ok_lines(&[
                    "2026-01-08 10:23:45 INFO ok one",
                    "garbage",
                    "2026-13-40 99:99:99 INFO bad clock",
                    "2026-01-08 10:24:10 ERROR ok two",
                ])),
                |line, err| rejects.push((line.to_string(), err.clone())),
            )
            .await;

        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.termination, Termination::EndOfStream);
        assert_eq!(summary.source, "test");

        assert_eq!(rejects.len(), 2);
        assert_eq!(rejects[0].0, "garbage");
        assert_eq!(rejects[0].1, ParseError::MalformedFields { found: 1 });
        assert!(matches!(rejects[1].1, ParseError::InvalidTimestamp(_)));

        assert_eq!(aggregator.len(), 2);
        assert_eq!(aggregator.severity_count(Severity::Critical), 1);
    }

    #[tokio::test]
    async fn read_fault_stops_only_this_loop() {
        let aggregator = shared_aggregator();
        let coordinator = Coordinator::new("faulty", Arc::clone(&aggregator));

        let lines = vec![
            Ok("2026-01-08 10:23:45 INFO before fault".to_string()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok("2026-01-08 10:23:46 INFO never read".to_string()),
        ];
        let summary = coordinator.handle(stream::iter(lines), |_, _| {}).await;

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.termination, Termination::ReadFault("reset".to_string()));
        assert_eq!(aggregator.len(), 1);
    }

    #[tokio::test]
    async fn closed_sink_ends_the_loop() {
        let coordinator = Coordinator::new("closed", ClosedSink);
        let summary = coordinator
            .handle(
                stream::iter(ok_lines(&[
                    "2026-01-08 10:23:45 INFO one",
                    "2026-01-08 10:23:46 INFO two",
                ])),
                |_, _| {},
            )
            .await;

        assert_eq!(summary.accepted, 0);
        assert_eq!(summary.termination, Termination::SinkClosed);
    }

    #[tokio::test]
    async fn empty_source_ends_immediately() {
        let aggregator = shared_aggregator();
        let coordinator = Coordinator::new("empty", Arc::clone(&aggregator));
        let summary = coordinator
            .handle(stream::iter(ok_lines(&[])), log_rejection("empty"))
            .await;

        assert_eq!(summary.accepted, 0);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.termination, Termination::EndOfStream);
        assert!(aggregator.is_empty());
    }

    #[test]
    fn termination_display() {
        assert_eq!(Termination::EndOfStream.to_string(), "end of stream");
        assert_eq!(
            Termination::ReadFault("reset".to_string()).to_string(),
            "read fault: reset"
        );
        assert_eq!(Termination::SinkClosed.to_string(), "sink closed");
    }
}
