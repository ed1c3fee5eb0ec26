//! Typed wrappers over the chat REST endpoints.

use crate::client::ApiClient;
use crate::error::{ChatError, Result};
use crate::types::{Channel, LoginResponse, Message, Server, ServerList, UserProfile};
use serde::Serialize;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

pub(crate) fn messages_path(channel_id: &str) -> String {
    format!("/channels/{}/messages", channel_id)
}

pub(crate) fn message_path(channel_id: &str, message_id: &str) -> String {
    format!("/channels/{}/messages/{}", channel_id, message_id)
}

impl ApiClient {
    /// `POST /auth/login` without a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = crate::types::ApiRequest::post("/auth/login")
            .anonymous()
            .with_json(&Credentials { username, password })?;
        self.execute(request).await?.json()
    }

    pub async fn profile(&self) -> Result<UserProfile> {
        self.require_token("fetch user profile")?;
        self.get_json("/auth/profile").await
    }

    pub async fn my_servers(&self) -> Result<Vec<Server>> {
        self.require_token("fetch servers")?;
        let list: ServerList = self.get_json("/servers/my-servers").await?;
        Ok(list.data)
    }

    pub async fn server(&self, server_id: &str) -> Result<Server> {
        self.get_json(&format!("/servers/{}", server_id)).await
    }

    pub async fn channels_by_server(&self, server_id: &str) -> Result<Vec<Channel>> {
        self.get_json(&format!("/servers/{}/channels", server_id))
            .await
    }

    pub async fn channel(&self, server_id: &str, channel_id: &str) -> Result<Channel> {
        self.get_json(&format!("/servers/{}/channels/{}", server_id, channel_id))
            .await
    }

    pub async fn messages_by_channel(&self, channel_id: &str) -> Result<Vec<Message>> {
        self.get_json(&messages_path(channel_id)).await
    }

    pub async fn message(&self, message_id: &str) -> Result<Message> {
        self.get_json(&format!("/messages/{}", message_id)).await
    }

    pub async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message> {
        self.post_json(&messages_path(channel_id), &ContentBody { content })
            .await
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Message> {
        self.patch_json(&message_path(channel_id, message_id), &ContentBody { content })
            .await
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        self.delete(&message_path(channel_id, message_id)).await
    }

    fn require_token(&self, action: &'static str) -> Result<()> {
        if self.session().current_token().is_none() {
            return Err(ChatError::Unauthenticated(action));
        }
        Ok(())
    }
}
