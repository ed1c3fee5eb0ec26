//! The push channel: one long-lived bidirectional connection with bounded
//! linear-backoff reconnection.

mod backoff;
mod manager;
mod state;
mod transport;
pub mod websocket;

pub use backoff::{ReconnectPolicy, RetryDecision};
pub use manager::{parse_frame, ChannelEvent, ConnectionManager, PushConfig};
pub use state::{Action, ConnectionMachine, ConnectionState, Phase};
pub use transport::{link_pair, LinkPeer, PushLink, TransportEvent};
pub use websocket::WebSocketTransport;
