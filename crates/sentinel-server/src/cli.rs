//! Command-line argument parsing with clap.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sentinel_logs::IngestMode;

use crate::client::SAMPLE_LINES;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::logging::LogFormat;
use crate::report::OutputFormat;

/// Sentinel - live log ingestion and aggregation.
#[derive(Parser, Debug, Clone)]
#[command(name = "sentinel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Format of diagnostic logs written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Accept producer connections until Ctrl-C, then print the aggregate.
    Serve(ServeArgs),

    /// Stream log lines to a running server.
    Send(SendArgs),

    /// Write the default configuration as JSON.
    InitConfig {
        /// File to write; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Arguments for `sentinel serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// JSON configuration file.
    #[arg(short, long, env = "SENTINEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration.
    #[arg(short, long, env = "SENTINEL_BIND")]
    pub bind: Option<SocketAddr>,

    /// Ingest mode (locked or funnel), overriding the configuration.
    #[arg(short, long)]
    pub mode: Option<IngestMode>,

    /// Format of the final report.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Include every stored record in the final report.
    #[arg(long)]
    pub records: bool,
}

impl ServeArgs {
    /// Load the configuration file, if any, and apply the overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded.
    pub fn load_config(&self) -> ServerResult<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        Ok(config)
    }
}

/// Arguments for `sentinel send`.
#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Server address.
    #[arg(short, long, env = "SENTINEL_ADDR", default_value = "127.0.0.1:9000")]
    pub addr: String,

    /// File whose lines are sent; the built-in samples when omitted.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Pause between lines in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    pub interval_ms: u64,
}

impl SendArgs {
    /// Pause between lines.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Lines to send.
    ///
    /// # Errors
    ///
    /// Returns an error if the input file cannot be read.
    pub fn lines(&self) -> ServerResult<Vec<String>> {
        match &self.file {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    ServerError::Config(format!(
                        "failed to read input file '{}': {e}",
                        path.display()
                    ))
                })?;
                Ok(content.lines().map(str::to_string).collect())
            }
            None => Ok(SAMPLE_LINES.iter().map(|l| (*l).to_string()).collect()),
        }
    }
}
