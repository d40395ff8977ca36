use std::collections::HashMap;

use tokio::time::Instant;

use scribble_core::artifact::Artifact;
use scribble_core::net::messages::{OpenRoomEntry, PlayerScoreEntry};
use scribble_core::player::{Player, PlayerId};
use scribble_core::room::{PhaseKind, RoomConfig};
use scribble_core::stroke::Stroke;

use crate::handoff::Handoff;
use crate::timers::{TimerHandle, TimerId};

/// What a `Playing` pause leads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interlude {
    /// Game just started; the next step opens a round.
    Round,
    /// Round intro shown; the next step starts a turn.
    Turn,
}

/// Sub-state of the drawing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawClock {
    /// Next countdown value to announce.
    Countdown(u8),
    /// Seconds left on the turn clock.
    Live(u16),
    /// Everyone guessed; waiting out the short grace before reveal.
    Closing,
}

/// Room phase. Every non-idle phase owns the one timer that may advance it,
/// so leaving a phase always cancels its timer.
#[derive(Debug)]
pub enum Phase {
    Waiting,
    Playing {
        next: Interlude,
        timer: TimerHandle,
    },
    Choosing {
        timer: TimerHandle,
    },
    Drawing {
        clock: DrawClock,
        timer: TimerHandle,
    },
    Reveal {
        handoff: Handoff,
        timer: TimerHandle,
    },
    End,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Self::Waiting => PhaseKind::Waiting,
            Self::Playing { .. } => PhaseKind::Playing,
            Self::Choosing { .. } => PhaseKind::Choosing,
            Self::Drawing { .. } => PhaseKind::Drawing,
            Self::Reveal { .. } => PhaseKind::Reveal,
            Self::End => PhaseKind::End,
        }
    }

    pub fn timer_id(&self) -> Option<TimerId> {
        match self {
            Self::Playing { timer, .. }
            | Self::Choosing { timer }
            | Self::Drawing { timer, .. }
            | Self::Reveal { timer, .. } => Some(timer.id()),
            Self::Waiting | Self::End => None,
        }
    }
}

pub struct Room {
    pub code: String,
    pub host_id: PlayerId,
    /// Join order. Disconnected players stay listed.
    pub players: Vec<Player>,
    pub config: RoomConfig,
    pub phase: Phase,
    pub round: u8,
    pub drawer_order: Vec<PlayerId>,
    /// Offset into the current `drawer_order`.
    pub drawer_index: usize,
    pub current_drawer: Option<PlayerId>,
    pub current_word: Option<String>,
    pub word_choices: Vec<String>,
    pub strokes: Vec<Stroke>,
    pub artifacts: Vec<Artifact>,
    pub turn_started_at: Option<Instant>,
    pub guessed_count: u32,
    pub scores_at_turn_start: HashMap<PlayerId, u32>,
    next_avatar: u32,
}

impl Room {
    pub fn new(code: String, host_id: PlayerId, host_name: String) -> Self {
        let mut room = Self {
            code,
            host_id,
            players: Vec::new(),
            config: RoomConfig::default(),
            phase: Phase::Waiting,
            round: 0,
            drawer_order: Vec::new(),
            drawer_index: 0,
            current_drawer: None,
            current_word: None,
            word_choices: Vec::new(),
            strokes: Vec::new(),
            artifacts: Vec::new(),
            turn_started_at: None,
            guessed_count: 0,
            scores_at_turn_start: HashMap::new(),
            next_avatar: 0,
        };
        room.add_player(host_id, host_name);
        room
    }

    /// Seat a player with the next unused avatar slot.
    pub fn add_player(&mut self, id: PlayerId, name: String) -> &Player {
        let avatar = self.next_avatar;
        self.next_avatar += 1;
        self.players.push(Player::new(id, name, avatar));
        &self.players[self.players.len() - 1]
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn player_name(&self, id: PlayerId) -> String {
        self.player(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn is_connected(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.connected)
    }

    pub fn connected_ids(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.connected)
            .map(|p| p.id)
            .collect()
    }

    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    /// Connected players other than `except`.
    pub fn others(&self, except: PlayerId) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.connected && p.id != except)
            .map(|p| p.id)
            .collect()
    }

    /// Promote the earliest-joined connected player if the host is gone.
    /// Returns the new host id when a promotion happened.
    pub fn promote_host(&mut self) -> Option<PlayerId> {
        if self.is_connected(self.host_id) {
            return None;
        }
        let next = self.players.iter().find(|p| p.connected)?.id;
        self.host_id = next;
        Some(next)
    }

    /// True once every connected non-drawer has guessed. Also true when no
    /// connected non-drawer remains.
    pub fn all_guessed(&self) -> bool {
        let drawer = self.current_drawer;
        self.players
            .iter()
            .filter(|p| p.connected && Some(p.id) != drawer)
            .all(|p| p.has_guessed)
    }

    /// Seconds left on the turn clock, floored at zero. Full time until the
    /// clock has started.
    pub fn time_remaining_secs(&self) -> u32 {
        let limit = u32::from(self.config.time_limit_secs);
        match self.turn_started_at {
            Some(start) => {
                let elapsed = start.elapsed().as_secs();
                limit.saturating_sub(u32::try_from(elapsed).unwrap_or(u32::MAX))
            },
            None => limit,
        }
    }

    pub fn score_entries(&self) -> Vec<PlayerScoreEntry> {
        self.players
            .iter()
            .map(|p| PlayerScoreEntry {
                player_id: p.id,
                player_name: p.display_name.clone(),
                score: p.score,
            })
            .collect()
    }

    /// Score gained by each player since the current turn began.
    pub fn turn_deltas(&self) -> Vec<PlayerScoreEntry> {
        self.players
            .iter()
            .map(|p| {
                let before = self.scores_at_turn_start.get(&p.id).copied().unwrap_or(0);
                PlayerScoreEntry {
                    player_id: p.id,
                    player_name: p.display_name.clone(),
                    score: p.score.saturating_sub(before),
                }
            })
            .collect()
    }

    /// Listing entry, present only while the room is joinable.
    pub fn open_room_entry(&self) -> Option<OpenRoomEntry> {
        let connected = self.connected_count();
        if self.phase_kind() != PhaseKind::Waiting || connected == 0 {
            return None;
        }
        Some(OpenRoomEntry {
            code: self.code.clone(),
            host_name: self
                .player(self.host_id)
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| "?".to_string()),
            player_count: connected as u32,
            config: self.config,
        })
    }

    /// Clear everything a finished game left behind, keeping the roster.
    pub fn reset_game(&mut self) {
        self.phase = Phase::Waiting;
        self.round = 0;
        self.drawer_order.clear();
        self.drawer_index = 0;
        self.current_drawer = None;
        self.current_word = None;
        self.word_choices.clear();
        self.strokes.clear();
        self.artifacts.clear();
        self.turn_started_at = None;
        self.guessed_count = 0;
        self.scores_at_turn_start.clear();
        for p in &mut self.players {
            p.score = 0;
            p.has_guessed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with(n: u64) -> Room {
        let mut room = Room::new("AB12".to_string(), 1, "Player1".to_string());
        for id in 2..=n {
            room.add_player(id, format!("Player{id}"));
        }
        room
    }

    #[test]
    fn avatars_are_never_reused() {
        let mut room = room_with(3);
        room.players.retain(|p| p.id != 2);
        let p = room.add_player(4, "Player4".to_string());
        assert_eq!(p.avatar_index, 3);
    }

    #[test]
    fn promote_host_picks_first_connected() {
        let mut room = room_with(3);
        assert_eq!(room.promote_host(), None);
        room.player_mut(1).unwrap().connected = false;
        room.player_mut(2).unwrap().connected = false;
        assert_eq!(room.promote_host(), Some(3));
        assert_eq!(room.host_id, 3);
    }

    #[test]
    fn all_guessed_ignores_drawer_and_disconnected() {
        let mut room = room_with(3);
        room.current_drawer = Some(1);
        assert!(!room.all_guessed());
        room.player_mut(2).unwrap().has_guessed = true;
        assert!(!room.all_guessed());
        room.player_mut(3).unwrap().connected = false;
        assert!(room.all_guessed());
    }

    #[test]
    fn all_guessed_when_no_guessers_left() {
        let mut room = room_with(2);
        room.current_drawer = Some(1);
        room.player_mut(2).unwrap().connected = false;
        assert!(room.all_guessed());
    }

    #[test]
    fn open_room_entry_only_while_waiting() {
        let mut room = room_with(2);
        let entry = room.open_room_entry().unwrap();
        assert_eq!(entry.host_name, "Player1");
        assert_eq!(entry.player_count, 2);
        room.phase = Phase::End;
        assert!(room.open_room_entry().is_none());
    }

    #[test]
    fn deltas_and_reset() {
        let mut room = room_with(2);
        room.player_mut(1).unwrap().score = 300;
        room.scores_at_turn_start = room.players.iter().map(|p| (p.id, p.score)).collect();
        room.player_mut(1).unwrap().score = 400;
        room.player_mut(2).unwrap().score = 450;
        let deltas = room.turn_deltas();
        assert_eq!(deltas[0].score, 100);
        assert_eq!(deltas[1].score, 450);

        room.player_mut(2).unwrap().has_guessed = true;
        room.reset_game();
        assert!(room.players.iter().all(|p| p.score == 0 && !p.has_guessed));
        assert_eq!(room.players.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn time_remaining_counts_down() {
        let mut room = room_with(2);
        room.config.time_limit_secs = 30;
        assert_eq!(room.time_remaining_secs(), 30);
        room.turn_started_at = Some(Instant::now());
        tokio::time::advance(std::time::Duration::from_secs(20)).await;
        assert_eq!(room.time_remaining_secs(), 10);
        tokio::time::advance(std::time::Duration::from_secs(60)).await;
        assert_eq!(room.time_remaining_secs(), 0);
    }
}
