//! Channel-backed link between the connection manager and a transport.

/// What a transport reports about its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame, unparsed.
    Frame(String),
    /// The peer closed the connection.
    Closed,
    /// The connection broke.
    Error(String),
}

/// The manager's end of an open connection.
///
/// Dropping `outbound` asks the transport to close the connection.
#[derive(Debug)]
pub struct PushLink {
    pub outbound: async_channel::Sender<String>,
    pub inbound: async_channel::Receiver<TransportEvent>,
}

/// The transport's end of an open connection.
#[derive(Debug)]
pub struct LinkPeer {
    pub outbound: async_channel::Receiver<String>,
    pub inbound: async_channel::Sender<TransportEvent>,
}

impl LinkPeer {
    /// Deliver an inbound frame; false once the manager has let go.
    pub async fn deliver(&self, text: impl Into<String>) -> bool {
        self.inbound
            .send(TransportEvent::Frame(text.into()))
            .await
            .is_ok()
    }

    pub async fn close(&self) {
        let _ = self.inbound.send(TransportEvent::Closed).await;
    }

    pub async fn fail(&self, reason: impl Into<String>) {
        let _ = self.inbound.send(TransportEvent::Error(reason.into())).await;
    }
}

/// Create both ends of a link.
pub fn link_pair() -> (PushLink, LinkPeer) {
    let (out_tx, out_rx) = async_channel::unbounded();
    let (in_tx, in_rx) = async_channel::bounded(100);
    (
        PushLink {
            outbound: out_tx,
            inbound: in_rx,
        },
        LinkPeer {
            outbound: out_rx,
            inbound: in_tx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_link_pair_carries_both_directions() {
        let (link, peer) = link_pair();

        link.outbound.send("{\"ping\":1}".to_string()).await.unwrap();
        assert_eq!(peer.outbound.recv().await.unwrap(), "{\"ping\":1}");

        assert!(peer.deliver("{}").await);
        assert_eq!(
            link.inbound.recv().await.unwrap(),
            TransportEvent::Frame("{}".into())
        );

        drop(link);
        assert!(peer.outbound.recv().await.is_err());
        assert!(!peer.deliver("late").await);
    }
}
