pub mod auth;
pub mod headers;
pub mod method;
pub mod request;
pub mod response;
