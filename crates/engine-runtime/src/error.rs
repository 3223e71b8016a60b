use connectors::error::TransportError;
use engine_config::error::ConfigError;
use engine_core::error::LogError;
use engine_processing::error::ProducerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize HTTP client: {0}")]
    Client(#[from] TransportError),

    #[error("Log error: {0}")]
    Log(#[from] LogError),

    #[error("Worker failed: {0}")]
    Producer(#[from] ProducerError),

    /// The worker task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Initialization error: {0}")]
    Initialization(String),
}
