//! WebSocket transport for the push channel.

use super::transport::{link_pair, LinkPeer, PushLink, TransportEvent};
use crate::error::{ChatError, Result};
use crate::traits::PushTransport;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

/// Opens one `tokio-tungstenite` connection per call.
#[derive(Debug, Default, Clone)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn open(&self, url: &str, bearer: Option<String>) -> Result<PushLink> {
        let mut request = url
            .into_client_request()
            .map_err(|e| ChatError::Config(format!("Invalid push URL {}: {}", url, e)))?;

        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ChatError::Config(e.to_string()))?;
            request.headers_mut().insert("Authorization", value);
        }

        let (ws_stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| ChatError::Network(format!("failed to connect websocket {}: {}", url, e)))?;
        tracing::info!("[ChatPush] WebSocket connected to {}", url);

        let (mut ws_writer, mut ws_reader) = ws_stream.split();
        let (link, peer) = link_pair();
        let LinkPeer { outbound, inbound } = peer;

        tokio::spawn(async move {
            while let Ok(text) = outbound.recv().await {
                if let Err(e) = ws_writer.send(Message::Text(text.into())).await {
                    tracing::warn!("[ChatPush] WebSocket send failed: {}", e);
                    break;
                }
            }
            let _ = ws_writer.close().await;
            tracing::debug!("[ChatPush] Writer ended");
        });

        tokio::spawn(async move {
            let terminal = loop {
                match ws_reader.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if inbound
                            .send(TransportEvent::Frame(text.as_str().to_string()))
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => {
                            if inbound.send(TransportEvent::Frame(text)).await.is_err() {
                                return;
                            }
                        }
                        Err(_) => tracing::warn!("[ChatPush] Dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break TransportEvent::Closed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break TransportEvent::Error(e.to_string()),
                }
            };
            tracing::info!("[ChatPush] WebSocket disconnected: {:?}", terminal);
            let _ = inbound.send(terminal).await;
        });

        Ok(link)
    }
}
