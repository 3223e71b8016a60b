use crate::error::ProducerError;
use engine_core::{error::LogError, log::LogSink};
use model::{pagination::offset::Offset, records::batch::Batch};
use planner::request::factory::HttpRequestFactory;
use std::sync::Arc;
use tracing::info;

/// Loads and commits the offset of one worker.
pub struct StateManager {
    worker: String,
    log: Arc<dyn LogSink>,
}

impl StateManager {
    pub fn new(worker: impl Into<String>, log: Arc<dyn LogSink>) -> Self {
        Self {
            worker: worker.into(),
            log,
        }
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// Seeds `factory` with the committed offset, or with its configured
    /// initial offset when nothing was committed yet.
    pub async fn seed(&self, factory: &mut dyn HttpRequestFactory) -> Result<Offset, ProducerError> {
        let committed = self
            .log
            .committed_offset(&self.worker)
            .await
            .map_err(|source| ProducerError::StateLoad {
                worker: self.worker.clone(),
                source,
            })?;

        if committed.is_empty() {
            info!(worker = %self.worker, "No committed offset found");
        } else {
            info!(worker = %self.worker, offset = %committed, "Found committed offset");
        }

        factory.initialize_offset(&committed);
        Ok(factory.current_offset().clone())
    }

    /// Hands the batch and its next offset to the log in one step.
    pub async fn commit(&self, batch: &Batch) -> Result<(), LogError> {
        self.log.append(&self.worker, batch).await
    }
}
