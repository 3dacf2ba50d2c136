//! TCP ingestion server.
//!
//! Every accepted connection gets its own [`Coordinator`] task; all of them
//! feed the single [`SharedAggregator`] owned by the server.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use sentinel_logs::{
    line_source, log_rejection, shared_aggregator, ConnectionSummary, Coordinator,
    SharedAggregator, Sink, Termination,
};
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::report::Report;

/// Unique identifier of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a fresh random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Totals over every connection a server run handled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerSummary {
    /// Connections handed to a coordinator.
    pub connections_accepted: u64,
    /// Connections closed immediately because the limit was reached.
    pub connections_refused: u64,
    /// Records submitted across all connections.
    pub records_accepted: u64,
    /// Lines dropped by the parser across all connections.
    pub lines_rejected: u64,
    /// Connections that ended on a read fault.
    pub read_faults: u64,
}

impl ServerSummary {
    fn record(&mut self, joined: Result<ConnectionSummary, JoinError>) {
        match joined {
            Ok(summary) => {
                self.records_accepted += summary.accepted;
                self.lines_rejected += summary.rejected;
                if matches!(summary.termination, Termination::ReadFault(_)) {
                    self.read_faults += 1;
                }
            }
            Err(e) => warn!(error = %e, "connection task failed"),
        }
    }
}

/// Log ingestion server.
#[derive(Debug)]
pub struct IngestServer {
    config: Arc<ServerConfig>,
    aggregator: SharedAggregator,
}

impl IngestServer {
    /// Create a new server with an empty aggregate.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_aggregator(config, shared_aggregator())
    }

    /// Create a server that feeds an existing aggregate.
    #[must_use]
    pub fn with_aggregator(config: ServerConfig, aggregator: SharedAggregator) -> Self {
        Self {
            config: Arc::new(config),
            aggregator,
        }
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared aggregate.
    #[must_use]
    pub fn aggregator(&self) -> SharedAggregator {
        Arc::clone(&self.aggregator)
    }

    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the address cannot be bound.
    pub async fn bind(&self) -> ServerResult<TcpListener> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(addr, e))?;

        let local = listener.local_addr().unwrap_or(addr);
        info!(addr = %local, mode = %self.config.mode, "ingestion server listening");
        Ok(listener)
    }

    /// Bind and run until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails.
    pub async fn serve(&self, shutdown: CancellationToken) -> ServerResult<ServerSummary> {
        let listener = self.bind().await?;
        self.run(listener, shutdown).await
    }

    /// Accept connections on `listener` until `shutdown` is cancelled.
    ///
    /// On shutdown, open connections are stopped, their tasks awaited and
    /// any queued records applied before this returns.
    ///
    /// # Errors
    ///
    /// Accept failures are logged and do not end the loop; this currently
    /// always returns `Ok`.
    pub async fn run(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> ServerResult<ServerSummary> {
        let (sink, worker) = Sink::start(
            self.config.mode,
            Arc::clone(&self.aggregator),
            self.config.funnel_capacity,
        );
        let limiter = (self.config.max_connections > 0)
            .then(|| Arc::new(Semaphore::new(self.config.max_connections)));
        let connections = shutdown.child_token();
        let mut ticker = self.config.report_interval().map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        let mut tasks = JoinSet::new();
        let mut summary = ServerSummary::default();

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    info!("shutdown requested, closing connections");
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    summary.record(joined);
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let permit = match &limiter {
                            Some(limiter) => {
                                if let Ok(permit) = Arc::clone(limiter).try_acquire_owned() {
                                    Some(permit)
                                } else {
                                    warn!(%peer, "connection refused: max connections reached");
                                    summary.connections_refused += 1;
                                    drop(stream);
                                    continue;
                                }
                            }
                            None => None,
                        };
                        summary.connections_accepted += 1;
                        tasks.spawn(self.connection_task(stream, peer, sink.clone(), permit, &connections));
                    }
                    Err(e) => warn!(error = %e, "failed to accept connection"),
                },
                () = next_tick(&mut ticker) => {
                    let (levels, severities) = self.aggregator.counts();
                    Report::from_counts(levels, severities).log();
                }
            }
        }

        drop(listener);
        connections.cancel();
        while let Some(joined) = tasks.join_next().await {
            summary.record(joined);
        }

        drop(sink);
        if let Some(worker) = worker {
            match worker.await {
                Ok(applied) => debug!(applied, "funnel worker drained"),
                Err(e) => warn!(error = %e, "funnel worker failed"),
            }
        }

        info!(
            connections = summary.connections_accepted,
            refused = summary.connections_refused,
            records = summary.records_accepted,
            rejected = summary.lines_rejected,
            "ingestion server stopped"
        );
        Ok(summary)
    }

    /// Build the task that drives one connection.
    fn connection_task(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        sink: Sink,
        permit: Option<OwnedSemaphorePermit>,
        connections: &CancellationToken,
    ) -> impl Future<Output = ConnectionSummary> + Send + use<> {
        let id = ConnectionId::new();
        let max_line_length = self.config.max_line_length;
        let stop = connections.clone().cancelled_owned();
        let span = info_span!("connection", %id, %peer);

        async move {
            let _permit = permit;
            info!("connection accepted");

            let label = peer.to_string();
            let lines = line_source(stream, max_line_length).take_until(stop);
            let summary = Coordinator::new(label.as_str(), sink)
                .handle(lines, log_rejection(&label))
                .await;

            match &summary.termination {
                Termination::ReadFault(error) => warn!(
                    %error,
                    accepted = summary.accepted,
                    rejected = summary.rejected,
                    "connection closed on read fault"
                ),
                termination => info!(
                    %termination,
                    accepted = summary.accepted,
                    rejected = summary.rejected,
                    "connection closed"
                ),
            }
            summary
        }
        .instrument(span)
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
