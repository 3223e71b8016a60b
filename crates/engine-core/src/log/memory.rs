use crate::{error::LogError, log::LogSink};
use async_trait::async_trait;
use model::{
    pagination::offset::Offset,
    records::batch::{Batch, LogRecord},
};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct WorkerLog {
    records: Vec<LogRecord>,
    offset: Offset,
    last_batch: Option<String>,
}

/// In-process log with the same append semantics as [`super::sled_log::SledLog`].
#[derive(Debug, Default)]
pub struct MemoryLog {
    workers: Mutex<HashMap<String, WorkerLog>>,
    failing_appends: AtomicUsize,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `worker` from an already committed offset.
    pub async fn seed_offset(&self, worker: &str, offset: Offset) {
        let mut workers = self.workers.lock().await;
        workers.entry(worker.to_string()).or_default().offset = offset;
    }

    /// Makes the next `count` appends fail without storing anything.
    pub fn fail_next_appends(&self, count: usize) {
        self.failing_appends.store(count, Ordering::SeqCst);
    }

    pub async fn records(&self, worker: &str) -> Vec<LogRecord> {
        let workers = self.workers.lock().await;
        workers
            .get(worker)
            .map(|log| log.records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogSink for MemoryLog {
    async fn append(&self, worker: &str, batch: &Batch) -> Result<(), LogError> {
        if self
            .failing_appends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(LogError::Unavailable(format!(
                "append rejected for {worker}"
            )));
        }

        let mut workers = self.workers.lock().await;
        let log = workers.entry(worker.to_string()).or_default();
        if log.last_batch.as_deref() == Some(batch.id.as_str()) {
            return Ok(());
        }

        log.records.extend(batch.records.iter().cloned());
        log.offset = batch.next.clone();
        log.last_batch = Some(batch.id.clone());
        Ok(())
    }

    async fn committed_offset(&self, worker: &str) -> Result<Offset, LogError> {
        let workers = self.workers.lock().await;
        Ok(workers
            .get(worker)
            .map(|log| log.offset.clone())
            .unwrap_or_default())
    }
}
