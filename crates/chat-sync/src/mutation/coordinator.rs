//! Message writes followed by cache invalidation.

use crate::cache::{CacheKey, QueryCache, ResourceKind};
use crate::client::ApiClient;
use crate::error::{ChatError, Result};
use crate::types::Message;
use std::sync::Arc;

/// Trimmed message content, or a validation error when nothing is left.
pub fn validate_content(content: &str) -> Result<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ChatError::Validation(
            "Message content cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Performs message writes and invalidates the cache once they succeed.
///
/// A failed write leaves the cache as it was. Writes are never retried.
#[derive(Clone)]
pub struct MutationCoordinator {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl MutationCoordinator {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub async fn send(&self, channel_id: &str, content: &str) -> Result<Message> {
        let content = validate_content(content)?;
        let message = self.api.send_message(channel_id, content).await?;
        tracing::debug!("Message {} sent to channel {}", message.message_id, channel_id);
        self.cache.invalidate(&CacheKey::messages(channel_id));
        Ok(message)
    }

    pub async fn edit(&self, channel_id: &str, message_id: &str, content: &str) -> Result<Message> {
        let content = validate_content(content)?;
        let message = self
            .api
            .edit_message(channel_id, message_id, content)
            .await?;
        tracing::debug!("Message {} edited in channel {}", message_id, channel_id);
        self.cache.invalidate(&CacheKey::messages(channel_id));
        Ok(message)
    }

    /// Delete a message.
    ///
    /// Every message collection is invalidated, not only `channel_id`'s.
    pub async fn delete(&self, channel_id: &str, message_id: &str) -> Result<()> {
        self.api.delete_message(channel_id, message_id).await?;
        let marked = self.cache.invalidate_kind(ResourceKind::Messages);
        tracing::debug!(
            "Message {} deleted, {} message collections invalidated",
            message_id,
            marked
        );
        Ok(())
    }
}
