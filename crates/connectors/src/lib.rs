//! Transport, authentication and response parsing for polled HTTP sources.
pub mod error;
pub mod http;
