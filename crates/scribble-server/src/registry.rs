use std::collections::HashMap;

use scribble_core::net::messages::{
    ChatKind, ChatMsg, ClientMessage, HostChangedMsg, JoinRoomMsg, JoinRoomResponseMsg,
    OpenRoomEntry, OpenRoomsMsg, PlayerJoinedMsg, PlayerLeftMsg, ServerMessage,
};
use scribble_core::net::protocol::PROTOCOL_VERSION;
use scribble_core::player::{PlayerId, sanitize_display_name};
use scribble_core::room::{PhaseKind, generate_room_code, is_valid_room_code, normalize_room_code};

use crate::config::TimingsConfig;
use crate::error::GameError;
use crate::game::{GameCtx, SYSTEM_SENDER};
use crate::gallery::SharedGallery;
use crate::game_loop::LobbyCommand;
use crate::outbox::{Outbox, PlayerSender};
use crate::room::Room;
use crate::timers::{Scheduler, TimerFired};

/// Counters reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct LobbyStats {
    pub rooms: usize,
    pub players: usize,
    pub connections: usize,
}

/// Owns every room and every live connection. Only the lobby task touches
/// it, so each event is handled to completion before the next one.
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    memberships: HashMap<PlayerId, String>,
    outbox: Outbox,
    scheduler: Scheduler,
    timings: TimingsConfig,
    gallery: SharedGallery,
    max_image_bytes: usize,
}

impl RoomRegistry {
    pub fn new(
        scheduler: Scheduler,
        timings: TimingsConfig,
        gallery: SharedGallery,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            outbox: Outbox::default(),
            scheduler,
            timings,
            gallery,
            max_image_bytes,
        }
    }

    pub fn handle(&mut self, cmd: LobbyCommand) {
        match cmd {
            LobbyCommand::Connect { player_id, sender } => self.connect(player_id, sender),
            LobbyCommand::Client { player_id, msg } => self.handle_client(player_id, msg),
            LobbyCommand::Disconnect { player_id } => self.disconnect(player_id),
            LobbyCommand::Timer(fired) => {
                self.handle_timer(fired);
            },
            LobbyCommand::Stats { reply } => {
                let _ = reply.send(self.stats());
            },
        }
    }

    pub fn stats(&self) -> LobbyStats {
        LobbyStats {
            rooms: self.rooms.len(),
            players: self.rooms.values().map(Room::connected_count).sum(),
            connections: self.outbox.len(),
        }
    }

    /// Register a new connection and show it the current open rooms.
    pub fn connect(&mut self, player_id: PlayerId, sender: PlayerSender) {
        self.outbox.register(player_id, sender);
        self.outbox.send_to(
            player_id,
            &ServerMessage::OpenRooms(OpenRoomsMsg {
                rooms: self.open_rooms(),
            }),
        );
    }

    pub fn handle_client(&mut self, player_id: PlayerId, msg: ClientMessage) {
        let result = match msg {
            ClientMessage::JoinRoom(join) => {
                if let Err(e) = self.join(player_id, join) {
                    tracing::debug!(player_id, "Join refused: {e}");
                    self.outbox.send_to(player_id, &join_error(&e));
                }
                return;
            },
            ClientMessage::ListOpenRooms(_) => {
                self.outbox.send_to(
                    player_id,
                    &ServerMessage::OpenRooms(OpenRoomsMsg {
                        rooms: self.open_rooms(),
                    }),
                );
                return;
            },
            other => self.dispatch_game(player_id, other),
        };
        if let Err(e) = result {
            tracing::debug!(player_id, "Ignored client action: {e}");
        }
    }

    fn dispatch_game(&mut self, player_id: PlayerId, msg: ClientMessage) -> Result<(), GameError> {
        let code = self
            .memberships
            .get(&player_id)
            .ok_or(GameError::StateConflict("not in a room"))?;
        let room = self.rooms.get_mut(code).ok_or(GameError::RoomNotFound)?;
        let listed_before = room.open_room_entry();

        let mut ctx = GameCtx {
            outbox: &self.outbox,
            scheduler: &mut self.scheduler,
            timings: &self.timings,
            gallery: &self.gallery,
            max_image_bytes: self.max_image_bytes,
        };
        let result = match msg {
            ClientMessage::UpdateConfig(m) => room.update_config(player_id, m.config, &mut ctx),
            ClientMessage::StartGame(_) => room.start_game(player_id, &mut ctx),
            ClientMessage::ChooseWord(m) => room.choose_word(player_id, &m.word, &mut ctx),
            ClientMessage::DrawStroke(m) => room.draw_stroke(player_id, m.stroke, &mut ctx),
            ClientMessage::ClearCanvas(_) => room.clear_canvas(player_id, &mut ctx),
            ClientMessage::SubmitGuess(m) => room.submit_guess(player_id, &m.text, &mut ctx),
            ClientMessage::SubmitArtifact(m) => {
                room.submit_artifact(player_id, m.image_data, &mut ctx)
            },
            ClientMessage::PlayAgain(_) => room.play_again(player_id, &mut ctx),
            ClientMessage::JoinRoom(_) | ClientMessage::ListOpenRooms(_) => Ok(()),
        };

        if room.open_room_entry() != listed_before {
            self.broadcast_open_rooms();
        }
        result
    }

    /// Route a fired timer to its room. Returns false when the room is gone
    /// or the timer no longer belongs to the room's current phase.
    pub fn handle_timer(&mut self, fired: TimerFired) -> bool {
        let Some(room) = self.rooms.get_mut(&fired.room) else {
            tracing::debug!(room = %fired.room, "Timer for closed room");
            return false;
        };
        if room.phase.timer_id() != Some(fired.id) {
            tracing::debug!(room = %fired.room, phase = ?room.phase_kind(), "Stale timer ignored");
            return false;
        }
        let mut ctx = GameCtx {
            outbox: &self.outbox,
            scheduler: &mut self.scheduler,
            timings: &self.timings,
            gallery: &self.gallery,
            max_image_bytes: self.max_image_bytes,
        };
        room.on_timer(&mut ctx);
        true
    }

    fn join(&mut self, player_id: PlayerId, msg: JoinRoomMsg) -> Result<(), GameError> {
        if msg.protocol_version != 0 && msg.protocol_version != PROTOCOL_VERSION {
            return Err(GameError::Invalid("protocol version"));
        }
        if self.memberships.contains_key(&player_id) {
            return Err(GameError::StateConflict("already in a room"));
        }
        let name = sanitize_display_name(&msg.player_name).ok_or(GameError::Invalid("name"))?;

        let requested = msg
            .room_code
            .as_deref()
            .map(normalize_room_code)
            .filter(|c| !c.is_empty());
        let code = match requested {
            Some(code) => {
                if !is_valid_room_code(&code) {
                    return Err(GameError::Invalid("room code"));
                }
                let room = self.rooms.get_mut(&code).ok_or(GameError::RoomNotFound)?;
                if room.phase_kind() != PhaseKind::Waiting {
                    return Err(GameError::GameInProgress);
                }
                room.add_player(player_id, name.clone());
                code
            },
            None => self.create_room(player_id, name.clone()),
        };
        self.memberships.insert(player_id, code.clone());

        let room = self.rooms.get(&code).ok_or(GameError::RoomNotFound)?;
        self.outbox.send_to(
            player_id,
            &ServerMessage::JoinRoomResponse(JoinRoomResponseMsg {
                success: true,
                player_id: Some(player_id),
                room_code: Some(code.clone()),
                players: room.players.clone(),
                host_id: Some(room.host_id),
                is_host: room.host_id == player_id,
                config: Some(room.config),
                error: None,
            }),
        );
        if let Some(player) = room.player(player_id) {
            self.outbox.broadcast(
                room.others(player_id),
                &ServerMessage::PlayerJoined(PlayerJoinedMsg {
                    player: player.clone(),
                    players: room.players.clone(),
                }),
            );
        }
        self.outbox.broadcast(
            room.connected_ids(),
            &ServerMessage::Chat(ChatMsg {
                sender: SYSTEM_SENDER.to_string(),
                text: format!("{name} joined the room."),
                kind: ChatKind::System,
            }),
        );
        tracing::info!(room = %code, player_id, "Player joined");
        self.broadcast_open_rooms();
        Ok(())
    }

    /// Create a room with `host_id` as host. Returns the new room code.
    pub fn create_room(&mut self, host_id: PlayerId, host_name: String) -> String {
        let code = generate_unique_room_code(&self.rooms);
        self.rooms
            .insert(code.clone(), Room::new(code.clone(), host_id, host_name));
        tracing::info!(room = %code, host_id, "Room created");
        code
    }

    pub fn disconnect(&mut self, player_id: PlayerId) {
        self.outbox.remove(player_id);
        let Some(code) = self.memberships.remove(&player_id) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&code) else {
            return;
        };
        let listed_before = room.open_room_entry();
        let player_name = room.player_name(player_id);
        if let Some(p) = room.player_mut(player_id) {
            p.connected = false;
        }

        if room.connected_count() == 0 {
            self.rooms.remove(&code);
            tracing::info!(room = %code, "Room closed");
            self.broadcast_open_rooms();
            return;
        }

        let new_host_id = room.promote_host();
        self.outbox.broadcast(
            room.connected_ids(),
            &ServerMessage::PlayerLeft(PlayerLeftMsg {
                player_id,
                player_name,
                players: room.players.clone(),
                new_host_id,
            }),
        );
        if let Some(host_id) = new_host_id {
            tracing::info!(room = %code, host_id, "Host promoted");
            self.outbox.broadcast(
                room.connected_ids(),
                &ServerMessage::HostChanged(HostChangedMsg { host_id }),
            );
        }

        let mut ctx = GameCtx {
            outbox: &self.outbox,
            scheduler: &mut self.scheduler,
            timings: &self.timings,
            gallery: &self.gallery,
            max_image_bytes: self.max_image_bytes,
        };
        room.handle_departure(player_id, &mut ctx);

        if room.open_room_entry() != listed_before {
            self.broadcast_open_rooms();
        }
    }

    /// Joinable rooms, sorted by code.
    pub fn open_rooms(&self) -> Vec<OpenRoomEntry> {
        let mut rooms: Vec<_> = self.rooms.values().filter_map(Room::open_room_entry).collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }

    fn broadcast_open_rooms(&self) {
        self.outbox.broadcast_all(&ServerMessage::OpenRooms(OpenRoomsMsg {
            rooms: self.open_rooms(),
        }));
    }
}

fn join_error(err: &GameError) -> ServerMessage {
    ServerMessage::JoinRoomResponse(JoinRoomResponseMsg {
        success: false,
        player_id: None,
        room_code: None,
        players: Vec::new(),
        host_id: None,
        is_host: false,
        config: None,
        error: Some(err.user_message()),
    })
}

fn generate_unique_room_code(existing: &HashMap<String, Room>) -> String {
    loop {
        let code = generate_room_code();
        if !existing.contains_key(&code) {
            return code;
        }
    }
}
