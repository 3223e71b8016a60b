use crate::{
    commands::{Commands, OffsetCommand},
    error::CliError,
    shutdown::ShutdownCoordinator,
};
use clap::Parser;
use engine_config::ConnectorConfig;
use engine_runtime::execution::{
    executor::{self, RunSummary},
    factory,
};
use model::pagination::offset::Offset;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod shutdown;

#[derive(Parser)]
#[command(name = "httpsource", version = "0.1.0", about = "HTTP polling source connector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, state_dir } => {
            let config = ConnectorConfig::load(&config)?;
            run(config, state_dir.as_deref()).await?;
        }
        Commands::Validate { config } => {
            let config = ConnectorConfig::load(&config)?;
            validate(&config)?;
            println!("Configuration is valid");
        }
        Commands::Offset { command } => match command {
            OffsetCommand::Show {
                config,
                state_dir,
                json,
            } => {
                let config = ConnectorConfig::load(&config)?;
                let log = executor::open_log(state_dir.as_deref(), &config.topic)?;
                print_offsets(&log.committed_offsets()?, json)?;
            }
            OffsetCommand::Reset {
                config,
                state_dir,
                worker,
            } => {
                let config = ConnectorConfig::load(&config)?;
                let log = executor::open_log(state_dir.as_deref(), &config.topic)?;
                if !log.reset_offset(&worker)? {
                    return Err(CliError::UnknownWorker(worker));
                }
                info!(worker = %worker, topic = %config.topic, "Offset reset");
            }
        },
    }

    Ok(())
}

async fn run(config: ConnectorConfig, state_dir: Option<&Path>) -> Result<(), CliError> {
    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.listen();

    let log = executor::open_log(state_dir, &config.topic)?;
    let summary = executor::run(config, log, shutdown.worker_token()).await?;

    match shutdown.received() {
        Some(signal) => info!(signal = %signal, "Connector stopped"),
        None => warn!("Workers stopped without a stop signal"),
    }
    log_summary(&summary);
    Ok(())
}

/// Builds every component the way `run` would, without polling.
fn validate(config: &ConnectorConfig) -> Result<(), CliError> {
    let shared = factory::create_shared(config)?;
    for index in 0..config.workers {
        let components = factory::create_components(config, index, &shared)?;
        info!(
            worker = %factory::worker_id(index),
            offset = %components.request_factory.current_offset(),
            "Worker configuration ok"
        );
    }
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    for (worker, stats) in &summary.workers {
        info!(
            worker = %worker,
            iterations = stats.iterations,
            records = stats.records,
            batches = stats.batches,
            failures = stats.failures,
            "Worker summary"
        );
    }

    let metrics = &summary.metrics;
    info!(
        polls = metrics.polls,
        records_emitted = metrics.records_emitted,
        records_filtered = metrics.records_filtered,
        bytes_emitted = metrics.bytes_emitted,
        batches_committed = metrics.batches_committed,
        transport_failures = metrics.transport_failures,
        parse_failures = metrics.parse_failures,
        mapping_failures = metrics.mapping_failures,
        commit_failures = metrics.commit_failures,
        "Connector metrics"
    );
}

fn print_offsets(offsets: &[(String, Offset)], as_json: bool) -> Result<(), CliError> {
    if as_json {
        let map: serde_json::Map<String, serde_json::Value> = offsets
            .iter()
            .map(|(worker, offset)| Ok((worker.clone(), serde_json::to_value(offset)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if offsets.is_empty() {
        println!("No committed offsets");
        return Ok(());
    }

    println!("{:<16} Offset", "Worker");
    println!("-----------------------------");
    for (worker, offset) in offsets {
        println!("{worker:<16} {offset}");
    }
    Ok(())
}
