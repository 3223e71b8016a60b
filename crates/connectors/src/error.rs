use thiserror::Error;

/// Failures while executing a request. All of them are recoverable: the
/// polling cycle logs them and retries the same offset on the next poll.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Invalid request URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Failures while turning a response into records. A parse error rejects
/// the whole response; no partial offset is ever derived from it.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    #[error("JSON pointer '{pointer}' did not match the response")]
    PointerNotFound { pointer: String },

    #[error("Invalid record timestamp '{value}'")]
    InvalidTimestamp { value: String },
}
