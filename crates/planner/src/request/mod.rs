pub mod error;
pub mod factory;
pub mod kv;
pub mod template;
