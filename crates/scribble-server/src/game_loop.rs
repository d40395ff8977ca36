use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use scribble_core::net::messages::ClientMessage;
use scribble_core::player::PlayerId;

use crate::config::ServerConfig;
use crate::gallery::SharedGallery;
use crate::outbox::PlayerSender;
use crate::registry::{LobbyStats, RoomRegistry};
use crate::timers::{Scheduler, TimerFired};

/// Events delivered to the lobby task from connections and timers.
#[derive(Debug)]
pub enum LobbyCommand {
    Connect {
        player_id: PlayerId,
        sender: PlayerSender,
    },
    Client {
        player_id: PlayerId,
        msg: ClientMessage,
    },
    Disconnect {
        player_id: PlayerId,
    },
    Timer(TimerFired),
    Stats {
        reply: oneshot::Sender<LobbyStats>,
    },
}

pub type LobbySender = mpsc::UnboundedSender<LobbyCommand>;

/// Spawn the lobby task that owns every room.
/// Returns the command sender and the task handle.
pub fn spawn_lobby(config: &ServerConfig, gallery: SharedGallery) -> (LobbySender, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let registry = RoomRegistry::new(
        Scheduler::new(cmd_tx.downgrade()),
        config.timings.clone(),
        gallery,
        config.limits.max_image_bytes,
    );
    let handle = tokio::spawn(run_lobby(registry, cmd_rx));
    (cmd_tx, handle)
}

/// Process commands one at a time until every sender is gone. Timers hold
/// only weak senders, so they do not keep the lobby alive.
async fn run_lobby(mut registry: RoomRegistry, mut cmd_rx: mpsc::UnboundedReceiver<LobbyCommand>) {
    tracing::info!("Lobby started");
    while let Some(cmd) = cmd_rx.recv().await {
        registry.handle(cmd);
    }
    tracing::info!("Lobby stopped");
}
