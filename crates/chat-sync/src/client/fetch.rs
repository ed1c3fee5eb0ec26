//! Main chat API client implementation.

use crate::client::config::ClientConfig;
use crate::client::native_network::NativeNetwork;
use crate::error::{ChatError, Result};
use crate::session::SessionStore;
use crate::traits::ChatNetwork;
use crate::types::{ApiRequest, ApiResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// The request layer: base URL, bearer injection and global 401 handling.
#[derive(Clone)]
pub struct ApiClient {
    pub network: Arc<dyn ChatNetwork>,
    pub config: Arc<ClientConfig>,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<SessionStore>) -> Result<Self> {
        url::Url::parse(&config.base_url)
            .map_err(|e| ChatError::Config(format!("Invalid base URL {}: {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connection_timeout_secs))
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        Ok(Self::with_network(
            config,
            session,
            Arc::new(NativeNetwork::new(client)),
        ))
    }

    pub fn with_network(
        config: ClientConfig,
        session: Arc<SessionStore>,
        network: Arc<dyn ChatNetwork>,
    ) -> Self {
        ApiClient {
            network,
            config: Arc::new(config),
            session,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Send a request and map non-success statuses to errors.
    ///
    /// A 401 on an authenticated request expires the session (clearing it
    /// and signalling that the login view is required) before returning
    /// [`ChatError::Unauthorized`].
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.config.url_for(&request.path);
        let authenticated = request.authenticated;
        let token = if authenticated {
            self.session.current_token()
        } else {
            None
        };

        if authenticated && token.is_none() {
            tracing::debug!("No auth token available for request: {}", request.path);
        }

        let method = request.method.clone();
        self.log_request(&method, &url);
        let response = self.network.execute(&url, request, token.as_deref()).await?;
        self.log_response(&method, &url, &response);

        if response.is_success() {
            return Ok(response);
        }

        if response.is_unauthorized() && authenticated {
            tracing::warn!("{} {} returned 401, expiring session", method, url);
            match token {
                Some(sent) => {
                    self.session.expire_if_current(&sent);
                }
                None => self.session.expire(),
            }
            return Err(ChatError::Unauthorized);
        }

        Err(ChatError::Http {
            status: response.status,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(ApiRequest::get(path)).await?.json()
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(ApiRequest::post(path).with_json(body)?)
            .await?
            .json()
    }

    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.execute(ApiRequest::patch(path).with_json(body)?)
            .await?
            .json()
    }

    /// `DELETE`; the response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(ApiRequest::delete(path)).await.map(|_| ())
    }

    fn log_request(&self, method: &str, url: &str) {
        if self.config.enable_logging {
            tracing::debug!("[ChatHTTP] -> {} {}", method, url);
        }
    }

    fn log_response(&self, method: &str, url: &str, response: &ApiResponse) {
        if self.config.enable_logging {
            tracing::debug!(
                "[ChatHTTP] <- {} {} status={} bytes={}",
                method,
                url,
                response.status,
                response.body.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStorage, SessionEvent};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Replies with a fixed status and records the bearer it saw.
    struct StubNetwork {
        status: u16,
        seen_bearer: Mutex<Vec<Option<String>>>,
    }

    impl StubNetwork {
        fn new(status: u16) -> Arc<Self> {
            Arc::new(Self {
                status,
                seen_bearer: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatNetwork for StubNetwork {
        async fn execute(
            &self,
            _url: &str,
            _req: ApiRequest,
            bearer: Option<&str>,
        ) -> Result<ApiResponse> {
            self.seen_bearer.lock().push(bearer.map(str::to_string));
            Ok(ApiResponse::new(self.status, "{}"))
        }
    }

    fn session_with_token(token: &str) -> Arc<SessionStore> {
        let storage = Arc::new(MemoryStorage::new());
        let session = Arc::new(SessionStore::new(storage));
        session.store_token(token).unwrap();
        session
    }

    #[tokio::test]
    async fn test_bearer_is_read_at_call_time() {
        let network = StubNetwork::new(200);
        let session = session_with_token("first");
        let client = ApiClient::with_network(ClientConfig::default(), session.clone(), network.clone());

        client.execute(ApiRequest::get("/a")).await.unwrap();
        session.store_token("second").unwrap();
        client.execute(ApiRequest::get("/b")).await.unwrap();
        client.execute(ApiRequest::get("/c").anonymous()).await.unwrap();

        let seen = network.seen_bearer.lock().clone();
        assert_eq!(
            seen,
            vec![Some("first".to_string()), Some("second".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_401_expires_session() {
        let network = StubNetwork::new(401);
        let session = session_with_token("tok");
        let mut events = session.subscribe();
        let client = ApiClient::with_network(ClientConfig::default(), session.clone(), network);

        let err = client.execute(ApiRequest::get("/servers/1")).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(session.current_token(), None);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoginRequired);
    }

    #[tokio::test]
    async fn test_anonymous_401_is_plain_http_error() {
        let network = StubNetwork::new(401);
        let session = session_with_token("tok");
        let client = ApiClient::with_network(ClientConfig::default(), session.clone(), network);

        let err = client
            .execute(ApiRequest::post("/auth/login").anonymous())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Http { status: 401 }));
        assert_eq!(session.current_token().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_other_status_is_http_error() {
        let network = StubNetwork::new(500);
        let session = session_with_token("tok");
        let client = ApiClient::with_network(ClientConfig::default(), session.clone(), network);

        let err = client.execute(ApiRequest::get("/x")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(session.current_token().is_some());
    }
}
