use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("Log storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Failed to encode log entry: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Corrupt log entry under '{key}'")]
    Corrupt { key: String },

    #[error("Log unavailable: {0}")]
    Unavailable(String),
}
