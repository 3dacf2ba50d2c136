//! End-to-end tests: a real server on a loopback port fed by the demo client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sentinel_logs::{IngestMode, Severity, SharedAggregator};
use sentinel_server::{send_lines, IngestServer, ServerConfig, ServerSummary, SAMPLE_LINES};
use test_case::test_case;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

struct Running {
    addr: SocketAddr,
    aggregator: SharedAggregator,
    shutdown: CancellationToken,
    task: JoinHandle<ServerSummary>,
}

impl Running {
    async fn start(config: ServerConfig) -> Self {
        let server = Arc::new(IngestServer::new(config.with_report_interval_secs(0)));
        let listener = server.bind().await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let aggregator = server.aggregator();
        let shutdown = CancellationToken::new();

        let token = shutdown.clone();
        let task = tokio::spawn(async move {
            server
                .run(listener, token)
                .await
                .expect("server run")
        });

        Self {
            addr,
            aggregator,
            shutdown,
            task,
        }
    }

    async fn wait_for_records(&self, expected: usize) {
        let aggregator = Arc::clone(&self.aggregator);
        tokio::time::timeout(WAIT, async move {
            while aggregator.len() < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("records should arrive in time");
    }

    async fn stop(self) -> ServerSummary {
        self.shutdown.cancel();
        tokio::time::timeout(WAIT, self.task)
            .await
            .expect("server should stop in time")
            .expect("server task")
    }
}

fn loopback() -> ServerConfig {
    ServerConfig::new(([127, 0, 0, 1], 0).into())
}

#[test_case(IngestMode::Locked ; "locked")]
#[test_case(IngestMode::Funnel ; "funnel")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sample_lines_over_tcp(mode: IngestMode) {
    let server = Running::start(loopback().with_mode(mode)).await;

    let sent = send_lines(&server.addr.to_string(), SAMPLE_LINES, Duration::ZERO)
        .await
        .expect("send samples");
    assert_eq!(sent, 5);
    server.wait_for_records(5).await;

    let aggregator = Arc::clone(&server.aggregator);
    let summary = server.stop().await;
    assert_eq!(summary.connections_accepted, 1);
    assert_eq!(summary.records_accepted, 5);
    assert_eq!(summary.lines_rejected, 0);

    let snapshot = aggregator.snapshot();
    assert!(snapshot.is_consistent());
    let levels: Vec<(&str, u64)> = snapshot
        .level_counts
        .iter()
        .map(|(k, n)| (k.as_str(), n))
        .collect();
    assert_eq!(levels, vec![("INFO", 2), ("ERROR", 2), ("WARN", 1)]);
    assert_eq!(snapshot.severity_counts.get(&Severity::Critical), 2);
    assert_eq!(snapshot.severity_counts.get(&Severity::Warning), 1);
    assert_eq!(snapshot.severity_counts.get(&Severity::Info), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_producers_lose_nothing() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 50;

    let config = loopback()
        .with_mode(IngestMode::Funnel)
        .with_funnel_capacity(4);
    let server = Running::start(config).await;
    let addr = server.addr.to_string();

    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let addr = addr.clone();
        producers.push(tokio::spawn(async move {
            let lines: Vec<String> = (0..PER_PRODUCER)
                .map(|i| format!("2026-01-08 10:23:45 INFO producer-{p}-{i}"))
                .collect();
            send_lines(&addr, &lines, Duration::ZERO).await
        }));
    }
    for producer in producers {
        producer.await.expect("producer task").expect("send");
    }

    server.wait_for_records(PRODUCERS * PER_PRODUCER).await;
    let aggregator = Arc::clone(&server.aggregator);
    let summary = server.stop().await;

    assert_eq!(summary.connections_accepted, PRODUCERS as u64);
    assert_eq!(summary.records_accepted, (PRODUCERS * PER_PRODUCER) as u64);
    assert_eq!(aggregator.level_count("INFO"), (PRODUCERS * PER_PRODUCER) as u64);
}

#[tokio::test]
async fn rejected_lines_are_counted() {
    let server = Running::start(loopback()).await;

    let lines = [
        "2026-01-08 10:23:45 INFO kept",
        "not a log line",
        "2026-02-30 10:23:45 INFO impossible date",
        "2026-01-08 10:23:46 WARN also kept",
    ];
    send_lines(&server.addr.to_string(), lines, Duration::ZERO)
        .await
        .expect("send");
    server.wait_for_records(2).await;

    // The rejects are counted when the connection task is joined.
    let summary = server.stop().await;
    assert_eq!(summary.records_accepted, 2);
    assert_eq!(summary.lines_rejected, 2);
}

#[tokio::test]
async fn invalid_utf8_keeps_the_connection_open() {
    let server = Running::start(loopback()).await;

    let mut producer = TcpStream::connect(server.addr).await.expect("connect");
    producer
        .write_all(b"2026-01-08 10:23:45 INFO caf\xe9\n\xff\xfe\n2026-01-08 10:23:46 ERROR after\n")
        .await
        .expect("write");
    producer.shutdown().await.expect("shutdown write half");
    server.wait_for_records(2).await;

    let aggregator = Arc::clone(&server.aggregator);
    let summary = server.stop().await;
    assert_eq!(summary.read_faults, 0);
    assert_eq!(summary.records_accepted, 2);
    assert_eq!(summary.lines_rejected, 1);
    assert_eq!(aggregator.level_count("ERROR"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlong_line_closes_only_that_connection() {
    let server = Running::start(loopback().with_max_line_length(128)).await;

    let mut faulty = TcpStream::connect(server.addr).await.expect("connect");
    let payload = format!(
        "2026-01-08 10:23:45 INFO before fault\n2026-01-08 10:23:45 INFO {}\n2026-01-08 10:23:46 INFO after\n",
        "x".repeat(256)
    );
    faulty.write_all(payload.as_bytes()).await.expect("write");
    let mut buf = Vec::new();
    // Server closes the socket; a reset is as good as EOF here.
    let _ = tokio::time::timeout(WAIT, faulty.read_to_end(&mut buf)).await;

    send_lines(&server.addr.to_string(), SAMPLE_LINES, Duration::ZERO)
        .await
        .expect("healthy producer");
    server.wait_for_records(6).await;

    let aggregator = Arc::clone(&server.aggregator);
    let summary = server.stop().await;
    assert_eq!(summary.read_faults, 1);
    assert_eq!(summary.records_accepted, 6);
    assert_eq!(aggregator.len(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn connections_over_limit_are_refused() {
    let server = Running::start(loopback().with_max_connections(1)).await;

    let mut first = TcpStream::connect(server.addr).await.expect("first connect");
    first
        .write_all(b"2026-01-08 10:23:45 INFO holding the slot\n")
        .await
        .expect("write");
    server.wait_for_records(1).await;

    let mut second = TcpStream::connect(server.addr).await.expect("second connect");
    let mut buf = [0u8; 1];
    let read = tokio::time::timeout(WAIT, second.read(&mut buf))
        .await
        .expect("refused connection should be closed");
    assert!(matches!(read, Ok(0) | Err(_)));

    drop(first);
    let summary = server.stop().await;
    assert_eq!(summary.connections_accepted, 1);
    assert_eq!(summary.connections_refused, 1);
}

#[tokio::test]
async fn shutdown_closes_idle_connections() {
    let server = Running::start(loopback()).await;

    let mut idle = TcpStream::connect(server.addr).await.expect("connect");
    idle.write_all(b"2026-01-08 10:23:45 INFO idle producer\n")
        .await
        .expect("write");
    server.wait_for_records(1).await;

    let summary = server.stop().await;
    assert_eq!(summary.connections_accepted, 1);
    assert_eq!(summary.records_accepted, 1);
}
