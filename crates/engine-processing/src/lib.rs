pub mod error;
pub mod filter;
pub mod mapper;
pub mod producer;
pub mod state_manager;
pub mod throttle;
