//! Server configuration.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use sentinel_logs::{IngestMode, DEFAULT_FUNNEL_CAPACITY, DEFAULT_MAX_LINE_LENGTH};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";

/// Default cap on simultaneous connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Default seconds between periodic aggregate reports.
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 10;

/// Configuration for the ingestion server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to accept producer connections on.
    pub bind_addr: SocketAddr,
    /// How records reach the aggregate.
    pub mode: IngestMode,
    /// Queue capacity in funnel mode.
    pub funnel_capacity: usize,
    /// Longest accepted line in bytes; longer lines close the connection.
    pub max_line_length: usize,
    /// Maximum simultaneous connections, 0 for unlimited.
    pub max_connections: usize,
    /// Seconds between periodic reports, 0 to disable.
    pub report_interval_secs: u64,
}

impl ServerConfig {
    /// Create a new server configuration with the specified bind address.
    #[must_use]
    pub const fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            mode: IngestMode::Locked,
            funnel_capacity: DEFAULT_FUNNEL_CAPACITY,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
        }
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ServerError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or fails validation.
    pub fn from_json(content: &str) -> ServerResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ServerError::Config(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ServerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> ServerResult<()> {
        if self.funnel_capacity == 0 {
            return Err(ServerError::Config(
                "funnel_capacity must be greater than 0".to_string(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(ServerError::Config(
                "max_line_length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Set the ingest mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: IngestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the funnel queue capacity.
    #[must_use]
    pub const fn with_funnel_capacity(mut self, capacity: usize) -> Self {
        self.funnel_capacity = capacity;
        self
    }

    /// Set the maximum line length.
    #[must_use]
    pub const fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the report interval in seconds.
    #[must_use]
    pub const fn with_report_interval_secs(mut self, secs: u64) -> Self {
        self.report_interval_secs = secs;
        self
    }

    /// Get the report interval, `None` when periodic reports are off.
    #[must_use]
    pub const fn report_interval(&self) -> Option<Duration> {
        if self.report_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.report_interval_secs))
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(([0, 0, 0, 0], 9000).into())
    }
}
