//! Derives the next HTTP request from the current offset.
pub mod request;
