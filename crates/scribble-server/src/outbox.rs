use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::mpsc;

use scribble_core::net::messages::ServerMessage;
use scribble_core::net::protocol::encode_server_message;
use scribble_core::player::PlayerId;

/// Bounded per-connection queue of encoded frames.
pub type PlayerSender = mpsc::Sender<Bytes>;

/// Every live connection's outbound queue, seated in a room or not.
#[derive(Default)]
pub struct Outbox {
    senders: HashMap<PlayerId, PlayerSender>,
}

impl Outbox {
    pub fn register(&mut self, player_id: PlayerId, sender: PlayerSender) {
        self.senders.insert(player_id, sender);
    }

    pub fn remove(&mut self, player_id: PlayerId) {
        self.senders.remove(&player_id);
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Send a message to a single connection.
    pub fn send_to(&self, player_id: PlayerId, msg: &ServerMessage) {
        if let Some(data) = encode(msg) {
            self.send_bytes(player_id, &data);
        }
    }

    /// Send one message to each of `targets`, encoding it once.
    pub fn broadcast(&self, targets: impl IntoIterator<Item = PlayerId>, msg: &ServerMessage) {
        let Some(data) = encode(msg) else {
            return;
        };
        for id in targets {
            self.send_bytes(id, &data);
        }
    }

    /// Send a message to every live connection.
    pub fn broadcast_all(&self, msg: &ServerMessage) {
        let Some(data) = encode(msg) else {
            return;
        };
        for id in self.senders.keys() {
            self.send_bytes(*id, &data);
        }
    }

    fn send_bytes(&self, player_id: PlayerId, data: &Bytes) {
        if let Some(sender) = self.senders.get(&player_id)
            && sender.try_send(data.clone()).is_err()
        {
            tracing::debug!(player_id, "Dropped message (channel full or closed)");
        }
    }
}

fn encode(msg: &ServerMessage) -> Option<Bytes> {
    match encode_server_message(msg) {
        Ok(data) => Some(Bytes::from(data)),
        Err(e) => {
            tracing::warn!("Failed to encode server message: {e}");
            None
        },
    }
}
