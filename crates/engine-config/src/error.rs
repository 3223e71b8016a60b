use planner::request::error::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration problems. All of them are fatal: they are reported before
/// the first poll and no worker is started.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required property: {key}")]
    Missing { key: String },

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown component '{value}' for '{key}' (expected one of: {expected})")]
    UnknownComponent {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Malformed template in '{key}' ('{value}'): {source}")]
    Template {
        key: String,
        value: String,
        #[source]
        source: TemplateError,
    },

    #[error("Template '{key}' references undeclared offset field '{placeholder}'")]
    UndeclaredPlaceholder { key: String, placeholder: String },

    #[error("Malformed properties at line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
