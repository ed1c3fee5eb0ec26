//! Configuration for the chat API client.

use std::time::Duration;

/// Configuration for the chat API client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub base_url: String,
    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Log every request and response at debug level.
    pub enable_logging: bool,
    /// Staleness window of message collections.
    pub messages_stale_after: Duration,
    /// Staleness window of channel lists and channel metadata.
    pub channels_stale_after: Duration,
    /// Staleness window of server lists and server metadata.
    pub servers_stale_after: Duration,
    /// Staleness window of the user profile.
    pub profile_stale_after: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: chat_common::DEFAULT_API_URL.to_string(),
            connection_timeout_secs: 30,
            request_timeout_ms: 30000,
            enable_logging: false,
            messages_stale_after: Duration::from_secs(30),
            channels_stale_after: Duration::from_secs(10 * 60),
            servers_stale_after: Duration::from_secs(10 * 60),
            profile_stale_after: Duration::from_secs(30 * 60),
        }
    }
}

impl ClientConfig {
    /// Defaults with the base URL resolved from the environment.
    pub fn from_env() -> Self {
        Self::with_base_url(chat_common::api_base_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        ClientConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Join a request path onto the base URL.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}
