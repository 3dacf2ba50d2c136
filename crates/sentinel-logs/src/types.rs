//! Core types for the ingestion engine.
//!
//! This module provides:
//! - [`LogRecord`] — One parsed log line
//! - [`Severity`] — Coarse class derived from a record's level
//! - [`Counts`] — Insertion-ordered occurrence counter
//! - [`AggregateSnapshot`] — Consistent copy of the aggregate state

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::UnknownName;

/// Timestamp layout used on the wire: `YYYY-MM-DD HH:MM:SS`.
pub const WIRE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A parsed log record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the producer says the event happened (no timezone).
    #[serde(with = "wire_timestamp")]
    pub timestamp: NaiveDateTime,
    /// Level token exactly as transmitted.
    pub level: String,
    /// Free-text remainder of the line.
    pub message: String,
}

impl LogRecord {
    /// Creates a record from its parts.
    #[must_use]
    pub fn new(
        timestamp: NaiveDateTime,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level: level.into(),
            message: message.into(),
        }
    }

    /// Returns the severity class of this record's level.
    #[must_use]
    pub fn severity(&self) -> Severity {
        classify(&self.level)
    }
}

/// Severity class derived from a level token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Derived from `ERROR`.
    Critical,
    /// Derived from `WARN`.
    Warning,
    /// Everything else, including unrecognized levels.
    Info,
}

impl Severity {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CRITICAL" => Ok(Self::Critical),
            "WARNING" => Ok(Self::Warning),
            "INFO" => Ok(Self::Info),
            _ => Err(UnknownName {
                kind: "severity",
                value: s.to_string(),
            }),
        }
    }
}

/// Maps a level token to its severity class.
///
/// Exact, case-sensitive match; any level other than `ERROR` or `WARN`
/// (including `DEBUG`, `FATAL` and garbage) is [`Severity::Info`].
#[must_use]
pub fn classify(level: &str) -> Severity {
    match level {
        "ERROR" => Severity::Critical,
        "WARN" => Severity::Warning,
        _ => Severity::Info,
    }
}

/// Occurrence counter that remembers the order keys were first seen.
#[derive(Debug, Clone)]
pub struct Counts<K> {
    entries: Vec<(K, u64)>,
    index: HashMap<K, usize>,
}

// `index` is derived from `entries`, so equality only looks at the latter.
impl<K: PartialEq> PartialEq for Counts<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq> Eq for Counts<K> {}

impl<K> Default for Counts<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Counts<K> {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one occurrence of `key`, inserting it on first sight.
    pub fn increment<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ToOwned<Owned = K> + Hash + Eq + ?Sized,
    {
        if let Some(&slot) = self.index.get(key) {
            self.entries[slot].1 += 1;
        } else {
            let owned = key.to_owned();
            self.index.insert(owned.clone(), self.entries.len());
            self.entries.push((owned, 1));
        }
    }

    /// Returns the count for `key`, zero if never seen.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map_or(0, |&slot| self.entries[slot].1)
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(key, count)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(k, n)| (k, *n))
    }
}

impl<K: Serialize> Serialize for Counts<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// A consistent, owned copy of the aggregate state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSnapshot {
    /// Records in the order the aggregator accepted them.
    pub records: Vec<LogRecord>,
    /// Occurrences per level token.
    pub level_counts: Counts<String>,
    /// Occurrences per severity class.
    pub severity_counts: Counts<Severity>,
}

impl AggregateSnapshot {
    /// Number of records captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks that both count totals match the number of records.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let n = self.records.len() as u64;
        self.level_counts.total() == n && self.severity_counts.total() == n
    }
}

mod wire_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::WIRE_TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(WIRE_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, WIRE_TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
