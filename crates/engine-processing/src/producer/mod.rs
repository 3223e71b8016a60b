use crate::error::{IterationError, ProducerError};
use async_trait::async_trait;
use model::pagination::offset::Offset;
use std::fmt;

pub mod live;

#[async_trait]
pub trait DataProducer {
    /// Polls until cancelled and returns what was done.
    async fn run(&mut self) -> Result<CycleStats, ProducerError>;
}

/// Step of an iteration a recoverable failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Request,
    Parse,
    Map,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Request => write!(f, "request"),
            Stage::Parse => write!(f, "parse"),
            Stage::Map => write!(f, "map"),
            Stage::Commit => write!(f, "commit"),
        }
    }
}

/// Result of one polling iteration.
#[derive(Debug)]
pub enum IterationOutcome {
    /// Records were committed together with `offset`.
    Delivered { records: usize, offset: Offset },
    /// Nothing new to deliver, but the offset moved forward.
    Advanced { offset: Offset },
    /// Nothing new and the offset is unchanged.
    Empty,
    /// The iteration was abandoned; the offset is unchanged.
    Failed { stage: Stage, error: IterationError },
    Stopped,
}

impl IterationOutcome {
    pub fn records(&self) -> usize {
        match self {
            IterationOutcome::Delivered { records, .. } => *records,
            _ => 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, IterationOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub iterations: u64,
    pub records: u64,
    pub batches: u64,
    pub failures: u64,
}

impl CycleStats {
    pub(crate) fn record(&mut self, outcome: &IterationOutcome) {
        match outcome {
            IterationOutcome::Stopped => return,
            IterationOutcome::Delivered { records, .. } => {
                self.records += *records as u64;
                self.batches += 1;
            }
            IterationOutcome::Advanced { .. } => self.batches += 1,
            IterationOutcome::Failed { .. } => self.failures += 1,
            IterationOutcome::Empty => {}
        }
        self.iterations += 1;
    }
}
