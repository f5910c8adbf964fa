//! Outbound delivery
//!
//! Sessions only talk to the outside world through [`Messenger`]. The server
//! uses [`Hub`], which forwards to each WebSocket connection's outbox.

use crate::protocol::ServerMessage;
use crate::types::ParticipantId;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Delivers server events to connected participants
pub trait Messenger: Send + Sync {
    /// Deliver to one participant. Unknown recipients are ignored.
    fn send_to(&self, participant: &ParticipantId, msg: ServerMessage);

    /// Deliver to every listed participant (everyone in a session)
    fn broadcast(&self, participants: &[ParticipantId], msg: ServerMessage) {
        for participant in participants {
            self.send_to(participant, msg.clone());
        }
    }

    /// Deliver to every open connection, seated or not
    fn announce(&self, msg: ServerMessage);
}

/// Sending half of a connection's outbox
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Registry of open connections
#[derive(Debug, Default)]
pub struct Hub {
    connections: DashMap<ParticipantId, Outbox>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection: issues its participant id and returns the outbox to drain
    pub fn register(&self) -> (ParticipantId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = ParticipantId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(id.clone(), tx);
        tracing::debug!("Connection registered: {}", id);
        (id, rx)
    }

    pub fn unregister(&self, participant: &ParticipantId) {
        if self.connections.remove(participant).is_some() {
            tracing::debug!("Connection unregistered: {}", participant);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Messenger for Hub {
    fn send_to(&self, participant: &ParticipantId, msg: ServerMessage) {
        if let Some(tx) = self.connections.get(participant) {
            // A closed outbox means the socket is going away; its disconnect handles cleanup
            if tx.send(msg).is_err() {
                tracing::debug!("Outbox closed for {}", participant);
            }
        }
    }

    fn announce(&self, msg: ServerMessage) {
        for entry in self.connections.iter() {
            if entry.value().send(msg.clone()).is_err() {
                tracing::debug!("Outbox closed for {}", entry.key());
            }
        }
    }
}
