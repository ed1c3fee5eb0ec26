//! Wire models returned by the chat API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAuthor {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub user: MessageAuthor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: String,
    pub server_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub server_id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Envelope of `GET /servers/my-servers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "statusCode", default)]
    pub status_code: u16,
    pub data: Vec<Server>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_field() {
        let channel: Channel = serde_json::from_value(serde_json::json!({
            "channel_id": "2",
            "server_id": "1",
            "name": "general",
            "type": "voice",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(channel.kind, ChannelKind::Voice);
    }

    #[test]
    fn test_server_list_envelope() {
        let list: ServerList = serde_json::from_value(serde_json::json!({
            "message": "ok",
            "statusCode": 200,
            "data": [{
                "server_id": "1",
                "name": "web",
                "owner_id": "u1",
                "created_at": "c",
                "updated_at": "u"
            }]
        }))
        .unwrap();
        assert_eq!(list.status_code, 200);
        assert_eq!(list.data[0].image, None);
    }
}
