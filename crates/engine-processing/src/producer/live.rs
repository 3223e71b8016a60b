use crate::{
    error::{IterationError, ProducerError},
    filter::{RecordFilter, RecordFilterFactory, retain_admitted},
    mapper::RecordMapper,
    producer::{CycleStats, DataProducer, IterationOutcome, Stage},
    state_manager::StateManager,
    throttle::{PollOutcome, Throttler, wait},
};
use async_trait::async_trait;
use connectors::{
    error::TransportError,
    http::{
        client::HttpClient,
        response::{HttpResponseParser, ParsedResponse},
    },
};
use engine_core::{log::LogSink, metrics::Metrics};
use model::{
    pagination::offset::Offset,
    records::{
        batch::{Batch, LogRecord},
        record::Record,
    },
};
use planner::request::factory::HttpRequestFactory;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything one worker needs to poll. Request factory and throttler are
/// stateful and owned by the worker; the rest may be shared.
pub struct PollingComponents {
    pub request_factory: Box<dyn HttpRequestFactory>,
    pub throttler: Box<dyn Throttler>,
    pub client: Arc<dyn HttpClient>,
    pub parser: Arc<dyn HttpResponseParser>,
    pub filter_factory: Arc<dyn RecordFilterFactory>,
    pub mapper: Arc<dyn RecordMapper>,
    /// Upper bound of a single request, connect included.
    pub request_timeout: Duration,
}

/// The offset-driven poll loop of a single worker.
///
/// Each iteration throttles, requests the window after the current offset,
/// parses, filters against the offset the iteration started from, maps and
/// commits. The offset only moves once the log accepted the batch.
pub struct PollingCycle {
    components: PollingComponents,
    state: StateManager,
    metrics: Metrics,
    cancel: CancellationToken,
    previous: Option<PollOutcome>,
    stats: CycleStats,
}

impl PollingCycle {
    /// Builds a cycle positioned at the worker's committed offset.
    pub async fn resume(
        worker: impl Into<String>,
        mut components: PollingComponents,
        log: Arc<dyn LogSink>,
        metrics: Metrics,
        cancel: CancellationToken,
    ) -> Result<Self, ProducerError> {
        let state = StateManager::new(worker, log);
        let start = state.seed(components.request_factory.as_mut()).await?;
        info!(worker = %state.worker(), offset = %start, "Polling cycle ready");

        Ok(Self {
            components,
            state,
            metrics,
            cancel,
            previous: None,
            stats: CycleStats::default(),
        })
    }

    pub fn worker(&self) -> &str {
        self.state.worker()
    }

    pub fn current_offset(&self) -> &Offset {
        self.components.request_factory.current_offset()
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Runs exactly one iteration.
    pub async fn tick(&mut self) -> IterationOutcome {
        let outcome = self.iterate().await;
        self.stats.record(&outcome);
        outcome
    }

    async fn iterate(&mut self) -> IterationOutcome {
        if self.cancel.is_cancelled() {
            return IterationOutcome::Stopped;
        }

        if let Some(previous) = self.previous {
            let interval = self.components.throttler.poll_interval(&previous);
            let remaining = interval.saturating_sub(previous.started_at.elapsed());
            debug!(worker = %self.worker(), wait_ms = remaining.as_millis() as u64, "Throttling");
            if !wait(remaining, &self.cancel).await {
                return IterationOutcome::Stopped;
            }
        }

        let started_at = Instant::now();
        let current = self.current_offset().clone();
        let request = self.components.request_factory.create_request();
        self.metrics.increment_polls();

        let client = Arc::clone(&self.components.client);
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = tokio::time::timeout(self.components.request_timeout, client.execute(&request)) => Some(result),
        };

        let response = match result {
            None => return IterationOutcome::Stopped,
            Some(Ok(Ok(response))) => response,
            Some(Ok(Err(err))) => {
                self.metrics.increment_transport_failures();
                return self.fail(started_at, Stage::Request, err.into());
            }
            Some(Err(_elapsed)) => {
                self.metrics.increment_transport_failures();
                let err = TransportError::Timeout {
                    url: request.url.clone(),
                };
                return self.fail(started_at, Stage::Request, err.into());
            }
        };

        let ParsedResponse {
            records,
            header_offset,
        } = match self.components.parser.parse(&response) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.metrics.increment_parse_failures();
                return self.fail(started_at, Stage::Parse, err.into());
            }
        };

        let filter = self.components.filter_factory.create(&current);
        let (admitted, dropped) = retain_admitted(filter.as_ref(), records);
        self.metrics.increment_filtered(dropped as u64);

        let records = match self.map_records(&admitted) {
            Ok(records) => records,
            Err(err) => return self.fail(started_at, Stage::Map, err),
        };

        let next = self.next_offset(&current, &header_offset, &admitted, filter.as_ref());

        if records.is_empty() && next == current {
            debug!(worker = %self.worker(), dropped, "Nothing new");
            self.previous = Some(PollOutcome::new(started_at, 0));
            return IterationOutcome::Empty;
        }

        let batch = Batch::new(self.make_batch_id(&current, &next), records, current, next);

        let committed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.state.commit(&batch) => Some(result),
        };
        match committed {
            None => return IterationOutcome::Stopped,
            Some(Err(err)) => {
                self.metrics.increment_commit_failures();
                return self.fail(started_at, Stage::Commit, err.into());
            }
            Some(Ok(())) => {}
        }

        self.components
            .request_factory
            .advance_offset(batch.next.clone());

        let delivered = batch.records.len();
        self.metrics.increment_batches();
        self.metrics.increment_records(delivered as u64);
        self.metrics.increment_bytes(batch.size_bytes() as u64);
        self.previous = Some(PollOutcome::new(started_at, delivered));

        if delivered == 0 {
            debug!(worker = %self.worker(), offset = %batch.next, "Advanced offset");
            IterationOutcome::Advanced { offset: batch.next }
        } else {
            info!(
                worker = %self.worker(),
                batch_id = %batch.id,
                records = delivered,
                dropped,
                offset = %batch.next,
                "Committed batch"
            );
            IterationOutcome::Delivered {
                records: delivered,
                offset: batch.next,
            }
        }
    }

    /// Position after this iteration. Rejected records never move it, and
    /// the boundary never falls behind the one the iteration started from.
    fn next_offset(
        &self,
        current: &Offset,
        header_offset: &Offset,
        admitted: &[Record],
        filter: &dyn RecordFilter,
    ) -> Offset {
        let next = match filter.furthest(admitted) {
            Some(record) => current.merged(header_offset).merged(&record.offset),
            None if header_offset.is_empty() => return current.clone(),
            None => current.merged(header_offset),
        };

        if filter.is_behind(&next) {
            warn!(
                worker = %self.worker(),
                current = %current,
                proposed = %next,
                "Response would move the offset backwards, keeping boundary"
            );
            return next.with_boundary_of(current);
        }
        next
    }

    /// Maps admitted records, skipping individual failures. Fails only when
    /// not a single record could be mapped.
    fn map_records(&self, admitted: &[Record]) -> Result<Vec<LogRecord>, IterationError> {
        let mut mapped = Vec::with_capacity(admitted.len());
        let mut failed = 0;
        let mut last_error = None;

        for record in admitted {
            match self.components.mapper.map(record) {
                Ok(log_record) => mapped.push(log_record),
                Err(err) => {
                    warn!(
                        worker = %self.worker(),
                        key = ?record.key,
                        error = %err,
                        "Skipping record that could not be mapped"
                    );
                    failed += 1;
                    last_error = Some(err);
                }
            }
        }

        if failed > 0 {
            self.metrics.increment_mapping_failures(failed as u64);
        }

        match last_error {
            Some(last) if mapped.is_empty() => Err(IterationError::Mapping { failed, last }),
            _ => Ok(mapped),
        }
    }

    fn fail(&mut self, started_at: Instant, stage: Stage, error: IterationError) -> IterationOutcome {
        warn!(
            worker = %self.worker(),
            stage = %stage,
            error = %error,
            offset = %self.current_offset(),
            "Iteration failed, offset unchanged"
        );
        self.previous = Some(PollOutcome::new(started_at, 0));
        IterationOutcome::Failed { stage, error }
    }

    fn make_batch_id(&self, from: &Offset, next: &Offset) -> String {
        let mut h = blake3::Hasher::new();
        h.update(self.worker().as_bytes());
        h.update(from.to_string().as_bytes());
        h.update(next.to_string().as_bytes());
        h.finalize().to_hex().to_string()
    }
}

#[async_trait]
impl DataProducer for PollingCycle {
    async fn run(&mut self) -> Result<CycleStats, ProducerError> {
        info!(worker = %self.worker(), "Starting polling cycle");

        loop {
            if let IterationOutcome::Stopped = self.tick().await {
                info!(worker = %self.worker(), "Cancellation requested. Stopping polling cycle.");
                break;
            }
        }

        let stats = self.stats;
        info!(
            worker = %self.worker(),
            iterations = stats.iterations,
            records = stats.records,
            batches = stats.batches,
            failures = stats.failures,
            offset = %self.current_offset(),
            "Polling cycle stopped"
        );
        Ok(stats)
    }
}
