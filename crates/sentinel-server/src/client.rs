//! Demo producer that streams log lines to a running server.

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{ServerError, ServerResult};

/// Lines sent when no input file is given.
pub const SAMPLE_LINES: [&str; 5] = [
    "2026-01-08 10:23:45 INFO User login successful user_id=1234",
    "2026-01-08 10:24:10 ERROR Database connection failed",
    "2026-01-08 10:25:05 WARN Disk space running low user_id=1234",
    "2026-01-08 10:26:30 INFO File uploaded successfully file_id=5678",
    "2026-01-08 10:27:15 ERROR Timeout while processing request",
];

/// Connects to `addr` and writes each line newline-terminated, pausing
/// `interval` between lines. Returns the number of lines sent.
///
/// # Errors
///
/// Returns an error if the connection cannot be established or a write fails.
pub async fn send_lines<I, S>(addr: &str, lines: I, interval: Duration) -> ServerResult<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|e| ServerError::ConnectFailed(addr.to_string(), e))?;
    info!(addr, "connected to ingestion server");

    let mut sent = 0usize;
    for line in lines {
        if sent > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }

        let line = line.as_ref();
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        sent += 1;
        debug!(line, "line sent");
    }

    stream.shutdown().await?;
    info!(addr, sent, "all lines sent");
    Ok(sent)
}
