use crate::error::LogError;
use async_trait::async_trait;
use model::{pagination::offset::Offset, records::batch::Batch};

pub mod memory;
pub mod sled_log;

/// Append-only destination of a source worker.
///
/// `append` stores the batch records and its `next` offset as one atomic
/// step: after a crash either both are visible or neither is.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, worker: &str, batch: &Batch) -> Result<(), LogError>;

    /// Last offset committed by `worker`, empty when it never committed.
    async fn committed_offset(&self, worker: &str) -> Result<Offset, LogError>;
}
