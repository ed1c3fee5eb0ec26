use crate::error::Result;
use crate::push::PushLink;
use crate::types::{ApiRequest, ApiResponse};
use async_trait::async_trait;

/// Abstraction for request/response network operations.
#[async_trait]
pub trait ChatNetwork: Send + Sync + 'static {
    /// Perform one request. `bearer` is the token read at call time.
    async fn execute(&self, url: &str, req: ApiRequest, bearer: Option<&str>)
        -> Result<ApiResponse>;
}

/// Abstraction for the push channel transport.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    /// Open one connection. Dropping the returned link's sender closes it.
    async fn open(&self, url: &str, bearer: Option<String>) -> Result<PushLink>;
}

/// Abstraction for the durable, session-scoped key/value store.
///
/// Calls are synchronous so that `SessionStore::clear` and
/// `SessionStore::current_token` never suspend.
pub trait SessionStorage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
