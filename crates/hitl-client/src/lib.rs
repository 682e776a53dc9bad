//! HTTP transport for the HITL console: configuration and the reqwest-backed gateway.

pub mod config;
pub mod http;

pub use config::{ClientConfig, ConfigError, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use http::HttpGateway;
