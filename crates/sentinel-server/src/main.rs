//! Sentinel binary entrypoint.
//!
//! `sentinel serve` runs the ingestion server, `sentinel send` is the demo
//! producer.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sentinel_server::cli::{Cli, Commands, SendArgs, ServeArgs};
use sentinel_server::{init_logging, send_lines, IngestServer, Report, ServerConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "sentinel failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => serve(args).await,
        Commands::Send(args) => send(args).await,
        Commands::InitConfig { output } => {
            let json = ServerConfig::default().to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json + "\n")
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "configuration written");
                }
                None => writeln!(io::stdout().lock(), "{json}")?,
            }
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let server = IngestServer::new(config);

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received");
                on_signal.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for interrupt"),
        }
    });

    let summary = server.serve(shutdown).await?;
    info!(
        connections = summary.connections_accepted,
        read_faults = summary.read_faults,
        "final aggregate"
    );

    let report = Report::from_snapshot(server.aggregator().snapshot(), args.records);
    report.write(&mut io::stdout().lock(), args.format)?;
    Ok(())
}

async fn send(args: SendArgs) -> anyhow::Result<()> {
    let lines = args.lines()?;
    let sent = send_lines(&args.addr, &lines, args.interval())
        .await
        .with_context(|| format!("sending to {}", args.addr))?;
    info!(sent, "done");
    Ok(())
}
