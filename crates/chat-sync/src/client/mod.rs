//! Chat API client implementation.

mod config;
mod endpoints;
mod fetch;
pub mod native_network;

pub use config::ClientConfig;
pub use fetch::ApiClient;
