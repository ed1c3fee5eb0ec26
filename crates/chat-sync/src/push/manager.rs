//! Drives the connection state machine against a real transport.

use super::backoff::ReconnectPolicy;
use super::state::{Action, ConnectionMachine, ConnectionState, Phase};
use super::transport::{PushLink, TransportEvent};
use super::websocket::WebSocketTransport;
use crate::error::{ChatError, Result};
use crate::session::SessionStore;
use crate::traits::PushTransport;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Configuration of one push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    pub url: String,
    pub policy: ReconnectPolicy,
    /// Capacity of the event broadcast; slow subscribers lag past it.
    pub event_capacity: usize,
}

impl PushConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            policy: ReconnectPolicy::default(),
            event_capacity: 64,
        }
    }

    /// Channel URL resolved by `chat_common::push_url`.
    pub fn from_env() -> Self {
        Self::new(chat_common::push_url())
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Typed stream item for channel subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    State(ConnectionState),
    /// An inbound frame that parsed as a JSON object.
    Frame(serde_json::Value),
    /// Retries exhausted; the channel is `Closed` until `connect()`.
    GaveUp { attempts: u32 },
}

/// One push channel. Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: PushConfig,
    transport: Arc<dyn PushTransport>,
    session: Arc<SessionStore>,
    shared: Mutex<Shared>,
    events: broadcast::Sender<ChannelEvent>,
}

struct Shared {
    machine: ConnectionMachine,
    outbound: Option<async_channel::Sender<String>>,
    timer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(
        config: PushConfig,
        transport: Arc<dyn PushTransport>,
        session: Arc<SessionStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let machine = ConnectionMachine::new(config.policy.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                session,
                shared: Mutex::new(Shared {
                    machine,
                    outbound: None,
                    timer: None,
                    reader: None,
                }),
                events,
            }),
        }
    }

    /// Manager backed by [`WebSocketTransport`].
    pub fn websocket(config: PushConfig, session: Arc<SessionStore>) -> Self {
        Self::new(config, Arc::new(WebSocketTransport::new()), session)
    }

    pub fn url(&self) -> &str {
        &self.inner.config.url
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().machine.state().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.inner.events.subscribe()
    }

    /// Start connecting. Ignored unless the channel is `Idle` or `Closed`.
    pub fn connect(&self) {
        let mut shared = self.inner.shared.lock();
        match shared.machine.connect() {
            Some(action) => {
                tracing::info!("[ChatPush] Connecting to {}", self.inner.config.url);
                self.inner.emit_state(&shared);
                self.inner.apply(&mut shared, action);
            }
            None => tracing::debug!(
                "[ChatPush] connect() ignored in phase {:?}",
                shared.machine.phase()
            ),
        }
    }

    /// Close the channel and cancel any pending reconnect. Idempotent.
    pub fn disconnect(&self) {
        let mut shared = self.inner.shared.lock();
        let was = shared.machine.phase();
        let action = shared.machine.disconnect();
        self.inner.apply(&mut shared, action);
        if was != Phase::Closed {
            tracing::info!("[ChatPush] Disconnected from {}", self.inner.config.url);
            self.inner.emit_state(&shared);
        }
    }

    /// Serialize and send `payload` if the channel is `Open`.
    ///
    /// Returns whether the frame was handed to the transport. Outside `Open`
    /// the payload is dropped, never queued.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        let text = match serde_json::to_string(payload) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("[ChatPush] Could not serialize outbound frame: {}", e);
                return false;
            }
        };

        let shared = self.inner.shared.lock();
        if shared.machine.phase() != Phase::Open {
            tracing::debug!(
                "[ChatPush] Dropping outbound frame in phase {:?}",
                shared.machine.phase()
            );
            return false;
        }
        match &shared.outbound {
            Some(tx) => tx.try_send(text).is_ok(),
            None => false,
        }
    }
}

impl Inner {
    fn emit_state(&self, shared: &Shared) {
        let _ = self
            .events
            .send(ChannelEvent::State(shared.machine.state().clone()));
    }

    fn apply(self: &Arc<Self>, shared: &mut Shared, action: Action) {
        match action {
            Action::Open { epoch } => self.spawn_open(epoch),
            Action::ScheduleRetry { epoch, delay } => {
                tracing::info!(
                    "[ChatPush] Reconnecting to {} in {:?} (attempt {})",
                    self.config.url,
                    delay,
                    shared.machine.state().attempt + 1
                );
                shared.outbound = None;
                let inner = Arc::clone(self);
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    inner.on_timer(epoch);
                });
                if let Some(old) = shared.timer.replace(timer) {
                    old.abort();
                }
            }
            Action::GiveUp { attempts } => {
                tracing::warn!(
                    "[ChatPush] Giving up on {} after {} retries",
                    self.config.url,
                    attempts
                );
                shared.outbound = None;
                let _ = self.events.send(ChannelEvent::GaveUp { attempts });
            }
            Action::Shutdown => {
                if let Some(timer) = shared.timer.take() {
                    timer.abort();
                }
                if let Some(reader) = shared.reader.take() {
                    reader.abort();
                }
                shared.outbound = None;
            }
        }
    }

    fn spawn_open(self: &Arc<Self>, epoch: u64) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let bearer = inner.session.current_token();
            let result = inner.transport.open(&inner.config.url, bearer).await;
            inner.on_open_result(epoch, result);
        });
    }

    fn on_open_result(self: &Arc<Self>, epoch: u64, result: Result<PushLink>) {
        let mut shared = self.shared.lock();
        match result {
            Ok(link) => {
                if !shared.machine.opened(epoch) {
                    tracing::debug!("[ChatPush] Discarding transport of a superseded attempt");
                    return;
                }
                tracing::info!("[ChatPush] Channel open: {}", self.config.url);
                shared.outbound = Some(link.outbound);
                let reader = self.spawn_reader(epoch, link.inbound);
                if let Some(old) = shared.reader.replace(reader) {
                    old.abort();
                }
                self.emit_state(&shared);
            }
            Err(e) => {
                tracing::warn!("[ChatPush] Failed to open {}: {}", self.config.url, e);
                if let Some(action) = shared.machine.lost(epoch) {
                    self.emit_state(&shared);
                    self.apply(&mut shared, action);
                }
            }
        }
    }

    fn spawn_reader(
        self: &Arc<Self>,
        epoch: u64,
        inbound: async_channel::Receiver<TransportEvent>,
    ) -> JoinHandle<()> {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            while let Ok(event) = inbound.recv().await {
                match event {
                    TransportEvent::Frame(text) => inner.on_frame(epoch, &text),
                    TransportEvent::Closed => {
                        tracing::info!("[ChatPush] Channel closed by peer");
                        break;
                    }
                    TransportEvent::Error(e) => {
                        tracing::warn!("[ChatPush] Channel error: {}", e);
                        break;
                    }
                }
            }
            inner.on_lost(epoch);
        })
    }

    fn on_frame(&self, epoch: u64, text: &str) {
        let value = match parse_frame(text) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("[ChatPush] Dropping inbound frame: {}", e);
                return;
            }
        };
        if !self.shared.lock().machine.is_current(epoch) {
            return;
        }
        let _ = self.events.send(ChannelEvent::Frame(value));
    }

    fn on_lost(self: &Arc<Self>, epoch: u64) {
        let mut shared = self.shared.lock();
        if let Some(action) = shared.machine.lost(epoch) {
            shared.outbound = None;
            self.emit_state(&shared);
            self.apply(&mut shared, action);
        }
    }

    fn on_timer(self: &Arc<Self>, epoch: u64) {
        let mut shared = self.shared.lock();
        if let Some(action) = shared.machine.timer_fired(epoch) {
            self.emit_state(&shared);
            self.apply(&mut shared, action);
        }
    }
}

/// Parse one inbound frame; anything but a JSON object is a parse error.
pub fn parse_frame(text: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ChatError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(ChatError::Parse("frame is not a JSON object".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame() {
        assert!(parse_frame(r#"{"type":"message","id":1}"#).is_ok());
        assert!(matches!(parse_frame("not json"), Err(ChatError::Parse(_))));
        assert!(matches!(parse_frame("[1,2]"), Err(ChatError::Parse(_))));
    }

    #[test]
    fn test_push_config_defaults() {
        let config = PushConfig::new("ws://localhost:3001/ws");
        assert_eq!(config.policy, ReconnectPolicy::default());
        assert_eq!(config.event_capacity, 64);
    }
}
