//! # sentinel-server
//!
//! TCP front end for the `sentinel-logs` ingestion engine.
//!
//! Producers connect over TCP and write newline-terminated log lines. Each
//! connection is driven by its own coordinator task; all of them feed one
//! shared aggregate that can be reported at any time.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sentinel_server::{IngestServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), sentinel_server::ServerError> {
//! let config = ServerConfig::new(([127, 0, 0, 1], 9000).into());
//! let server = IngestServer::new(config);
//!
//! let shutdown = CancellationToken::new();
//! let summary = server.serve(shutdown).await?;
//! println!("{} records ingested", summary.records_accepted);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod server;

// Re-export main types
pub use client::{send_lines, SAMPLE_LINES};
pub use config::{
    ServerConfig, DEFAULT_BIND_ADDR, DEFAULT_MAX_CONNECTIONS, DEFAULT_REPORT_INTERVAL_SECS,
};
pub use error::{ServerError, ServerResult};
pub use logging::{init_logging, LogFormat};
pub use report::{OutputFormat, Report};
pub use server::{ConnectionId, IngestServer, ServerSummary};
