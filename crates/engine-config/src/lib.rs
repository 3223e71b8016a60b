//! Typed configuration of the HTTP source connector.
pub mod error;
pub mod properties;
pub mod registry;
pub mod settings;

pub use settings::ConnectorConfig;
