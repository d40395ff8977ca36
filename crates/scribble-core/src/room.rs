use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 4;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const MIN_ROUNDS: u8 = 1;
pub const MAX_ROUNDS: u8 = 10;
pub const MIN_TIME_LIMIT_SECS: u16 = 30;
pub const MAX_TIME_LIMIT_SECS: u16 = 120;

/// Host-editable match settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    pub rounds: u8,
    pub time_limit_secs: u16,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            time_limit_secs: 80,
        }
    }
}

impl RoomConfig {
    /// Build a config, returning `None` if either value is out of bounds.
    pub fn new(rounds: u8, time_limit_secs: u16) -> Option<Self> {
        let cfg = Self {
            rounds,
            time_limit_secs,
        };
        cfg.is_valid().then_some(cfg)
    }

    pub fn is_valid(&self) -> bool {
        (MIN_ROUNDS..=MAX_ROUNDS).contains(&self.rounds)
            && (MIN_TIME_LIMIT_SECS..=MAX_TIME_LIMIT_SECS).contains(&self.time_limit_secs)
    }
}

/// Coarse room phase as seen by clients and the open-room listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Waiting,
    /// Between turns: game starting or round intro.
    Playing,
    Choosing,
    Drawing,
    Reveal,
    End,
}

impl PhaseKind {
    /// Whether a game is running (anything between start and end).
    pub fn in_game(self) -> bool {
        !matches!(self, Self::Waiting | Self::End)
    }
}

/// Generate a random room code like `K7QZ`.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Trim and upper-case a user-supplied room code.
pub fn normalize_room_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Check that a (normalized) code has the room code shape.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_valid() {
        for _ in 0..200 {
            let code = generate_room_code();
            assert!(is_valid_room_code(&code), "invalid room code: {code}");
        }
    }

    #[test]
    fn normalize_then_validate() {
        assert_eq!(normalize_room_code("  ab12 "), "AB12");
        assert!(is_valid_room_code(&normalize_room_code("ab12")));
        assert!(!is_valid_room_code("AB1"));
        assert!(!is_valid_room_code("AB-12"));
        assert!(!is_valid_room_code("ab12"));
    }

    #[test]
    fn config_bounds() {
        assert!(RoomConfig::default().is_valid());
        assert!(RoomConfig::new(1, 30).is_some());
        assert!(RoomConfig::new(10, 120).is_some());
        assert!(RoomConfig::new(0, 80).is_none());
        assert!(RoomConfig::new(11, 80).is_none());
        assert!(RoomConfig::new(3, 29).is_none());
        assert!(RoomConfig::new(3, 121).is_none());
    }

    #[test]
    fn in_game_phases() {
        assert!(!PhaseKind::Waiting.in_game());
        assert!(!PhaseKind::End.in_game());
        assert!(PhaseKind::Playing.in_game());
        assert!(PhaseKind::Reveal.in_game());
    }
}
