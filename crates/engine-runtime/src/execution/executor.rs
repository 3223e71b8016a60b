use crate::{
    error::RuntimeError,
    execution::{
        factory::{self, SharedComponents},
        workers,
    },
};
use connectors::http::client::HttpClient;
use engine_config::ConnectorConfig;
use engine_core::{
    log::{LogSink, sled_log::SledLog},
    metrics::{Metrics, MetricsSnapshot},
};
use engine_processing::producer::{CycleStats, live::PollingCycle};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// What a connector run did, per worker and in total.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub workers: Vec<(String, CycleStats)>,
    pub metrics: MetricsSnapshot,
}

pub async fn run(
    config: ConnectorConfig,
    log: Arc<dyn LogSink>,
    cancel: CancellationToken,
) -> Result<RunSummary, RuntimeError> {
    ConnectorExecutor::new(config, log, cancel)?
        .execute()
        .await
}

/// Directory the sled log lives in when none is configured.
pub fn default_state_dir() -> Result<PathBuf, RuntimeError> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        RuntimeError::Initialization("Could not determine home directory".to_string())
    })?;
    Ok(home_dir.join(".httpsource/state"))
}

pub fn open_log(state_dir: Option<&Path>, topic: &str) -> Result<Arc<SledLog>, RuntimeError> {
    let dir = match state_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_state_dir()?,
    };
    info!(path = %dir.display(), topic, "Opening log");
    Ok(Arc::new(SledLog::open(dir, topic)?))
}

pub struct ConnectorExecutor {
    config: ConnectorConfig,
    shared: SharedComponents,
    log: Arc<dyn LogSink>,
    metrics: Metrics,
    cancel: CancellationToken,
}

impl ConnectorExecutor {
    pub fn new(
        config: ConnectorConfig,
        log: Arc<dyn LogSink>,
        cancel: CancellationToken,
    ) -> Result<Self, RuntimeError> {
        let shared = factory::create_shared(&config)?;
        Ok(Self {
            config,
            shared,
            log,
            metrics: Metrics::new(),
            cancel,
        })
    }

    /// Replaces the configured HTTP client for every worker.
    pub fn with_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.shared.client = client;
        self
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    /// Builds and resumes every worker before the first poll, then runs
    /// them until cancelled.
    pub async fn execute(self) -> Result<RunSummary, RuntimeError> {
        info!(
            topic = %self.config.topic,
            workers = self.config.workers,
            url = %self.config.request.url,
            "Starting connector"
        );

        let components = (0..self.config.workers)
            .map(|index| factory::create_components(&self.config, index, &self.shared))
            .collect::<Result<Vec<_>, _>>()?;

        let mut cycles = Vec::with_capacity(components.len());
        for (index, components) in components.into_iter().enumerate() {
            let cycle = PollingCycle::resume(
                factory::worker_id(index),
                components,
                self.log.clone(),
                self.metrics.clone(),
                self.cancel.child_token(),
            )
            .await?;
            cycles.push(cycle);
        }

        let workers = workers::spawn(cycles).await?;
        let metrics = self.metrics.snapshot();

        info!(
            polls = metrics.polls,
            records = metrics.records_emitted,
            batches = metrics.batches_committed,
            failures = metrics.failures(),
            "Connector stopped"
        );

        Ok(RunSummary { workers, metrics })
    }
}
