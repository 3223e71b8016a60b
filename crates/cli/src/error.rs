use engine_config::error::ConfigError;
use engine_core::error::LogError;
use engine_runtime::error::RuntimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid connector configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Connector failed: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Log error: {0}")]
    Log(#[from] LogError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("No committed offset for worker '{0}'")]
    UnknownWorker(String),
}
