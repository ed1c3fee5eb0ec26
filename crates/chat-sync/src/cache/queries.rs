//! Fetch-through readers: serve fresh cache entries, refetch stale ones.

use super::store::{CacheKey, QueryCache};
use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{Channel, Message, Server, UserProfile};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Queries {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl Queries {
    /// The cache is attached to the client's session, so it is dropped
    /// whenever the session is reset or a different token is stored.
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        api.session().attach_cache(cache.clone());
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub async fn messages(&self, channel_id: &str) -> Result<Vec<Message>> {
        let stale_after = self.api.config().messages_stale_after;
        self.fetch_through(CacheKey::messages(channel_id), stale_after, || {
            self.api.messages_by_channel(channel_id)
        })
        .await
    }

    pub async fn channels(&self, server_id: &str) -> Result<Vec<Channel>> {
        let stale_after = self.api.config().channels_stale_after;
        self.fetch_through(CacheKey::channels(server_id), stale_after, || {
            self.api.channels_by_server(server_id)
        })
        .await
    }

    pub async fn channel(&self, server_id: &str, channel_id: &str) -> Result<Channel> {
        let stale_after = self.api.config().channels_stale_after;
        self.fetch_through(CacheKey::channel(channel_id), stale_after, || {
            self.api.channel(server_id, channel_id)
        })
        .await
    }

    pub async fn servers(&self) -> Result<Vec<Server>> {
        let stale_after = self.api.config().servers_stale_after;
        self.fetch_through(CacheKey::servers(), stale_after, || self.api.my_servers())
            .await
    }

    pub async fn server(&self, server_id: &str) -> Result<Server> {
        let stale_after = self.api.config().servers_stale_after;
        self.fetch_through(CacheKey::server(server_id), stale_after, || {
            self.api.server(server_id)
        })
        .await
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        let stale_after = self.api.config().profile_stale_after;
        self.fetch_through(CacheKey::profile(), stale_after, || self.api.profile())
            .await
    }

    async fn fetch_through<T, F, Fut>(&self, key: CacheKey, stale_after: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.cache.fresh(&key) {
            tracing::debug!("Cache hit: {:?}", key);
            return Ok(value);
        }

        let generation = self.cache.generation();
        let value = fetch().await?;
        self.cache
            .insert_fetched(key, &value, stale_after, generation)?;
        Ok(value)
    }
}
