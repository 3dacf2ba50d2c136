//! Aggregate reports for humans and machines.
//!
//! Supports a text table and pretty JSON.

use std::fmt;
use std::io::Write;

use clap::ValueEnum;
use sentinel_logs::{AggregateSnapshot, Counts, LogRecord, Severity, WIRE_TIMESTAMP_FORMAT};
use serde::Serialize;
use tracing::info;

use crate::error::ServerResult;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Summary of the aggregate at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Number of stored records.
    pub total_records: u64,
    /// Occurrences per level token, in first-seen order.
    pub level_counts: Counts<String>,
    /// Occurrences per severity class, in first-seen order.
    pub severity_counts: Counts<Severity>,
    /// Every stored record, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<LogRecord>>,
}

impl Report {
    /// Builds a report from a snapshot, optionally keeping the records.
    #[must_use]
    pub fn from_snapshot(snapshot: AggregateSnapshot, include_records: bool) -> Self {
        Self {
            total_records: snapshot.len() as u64,
            level_counts: snapshot.level_counts,
            severity_counts: snapshot.severity_counts,
            records: include_records.then_some(snapshot.records),
        }
    }

    /// Builds a counts-only report.
    #[must_use]
    pub fn from_counts(level_counts: Counts<String>, severity_counts: Counts<Severity>) -> Self {
        Self {
            total_records: level_counts.total(),
            level_counts,
            severity_counts,
            records: None,
        }
    }

    /// Emits the counts as one structured `info` event.
    pub fn log(&self) {
        let levels = serde_json::to_string(&self.level_counts).unwrap_or_default();
        let severities = serde_json::to_string(&self.severity_counts).unwrap_or_default();
        info!(
            total_records = self.total_records,
            level_counts = %levels,
            severity_counts = %severities,
            "aggregate report"
        );
    }

    /// Writes the report in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W: Write>(&self, writer: &mut W, format: OutputFormat) -> ServerResult<()> {
        match format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, self)?;
                writeln!(writer)?;
            }
            OutputFormat::Text => write!(writer, "{self}")?,
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Aggregate Report")?;
        writeln!(f, "══════════════════════════════════")?;
        writeln!(f, "Total records:    {}", self.total_records)?;
        writeln!(f)?;

        writeln!(f, "Levels")?;
        if self.level_counts.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (level, count) in self.level_counts.iter() {
            writeln!(f, "  {level:<16}{count}")?;
        }
        writeln!(f)?;

        writeln!(f, "Severities")?;
        if self.severity_counts.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (severity, count) in self.severity_counts.iter() {
            writeln!(f, "  {:<16}{count}", severity.as_str())?;
        }

        if let Some(records) = &self.records {
            writeln!(f)?;
            writeln!(f, "Records")?;
            for record in records {
                writeln!(
                    f,
                    "  {} {:<8}{}",
                    record.timestamp.format(WIRE_TIMESTAMP_FORMAT),
                    record.level,
                    record.message
                )?;
            }
        }
        Ok(())
    }
}
