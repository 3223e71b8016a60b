pub mod core;
pub mod http;
pub mod pagination;
pub mod records;
