use serde::{Deserialize, Serialize};

/// Unique identifier for a connected client. Assigned per WebSocket
/// connection and reused as the player id once the connection joins a room.
pub type PlayerId = u64;

/// Maximum display name length in characters (longer names are truncated).
pub const MAX_NAME_LEN: usize = 20;

/// A player seated in a Scribble room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub score: u32,
    /// Set once the player guessed the word in the current turn.
    pub has_guessed: bool,
    /// Disconnected players stay in the roster so scores and turn order
    /// remain valid for the rest of the game.
    pub connected: bool,
    /// Stable per-room avatar slot, never reused within a room.
    pub avatar_index: u32,
}

impl Player {
    pub fn new(id: PlayerId, display_name: String, avatar_index: u32) -> Self {
        Self {
            id,
            display_name,
            score: 0,
            has_guessed: false,
            connected: true,
            avatar_index,
        }
    }
}

/// Normalize a requested display name: trimmed, truncated to
/// [`MAX_NAME_LEN`] characters. Returns `None` for empty names or names
/// containing control characters.
pub fn sanitize_display_name(raw: &str) -> Option<String> {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() || name.chars().any(char::is_control) {
        return None;
    }
    Some(name)
}
