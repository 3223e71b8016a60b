use connectors::error::{ParseError, TransportError};
use engine_core::error::LogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record cannot be mapped: {0}")]
    Invalid(String),
}

/// Recoverable failure of a single iteration. The offset is left unchanged
/// and the same window is polled again.
#[derive(Error, Debug)]
pub enum IterationError {
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Response rejected: {0}")]
    Parse(#[from] ParseError),

    #[error("None of the {failed} admitted records could be mapped, last error: {last}")]
    Mapping { failed: usize, last: MapperError },

    #[error("Log rejected the batch: {0}")]
    Log(#[from] LogError),
}

/// Fatal producer failures; the worker stops.
#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("Failed to load committed offset for {worker}: {source}")]
    StateLoad {
        worker: String,
        #[source]
        source: LogError,
    },
}
