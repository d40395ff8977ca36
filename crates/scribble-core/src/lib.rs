pub mod artifact;
pub mod guess;
pub mod net;
pub mod player;
pub mod room;
pub mod stroke;
pub mod time;
pub mod words;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::player::{Player, PlayerId};
    use crate::stroke::{Stroke, Tool};

    /// A complete 1x1 PNG as a data URL, accepted by artifact validation.
    pub const TINY_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    /// Create `n` test players with sequential IDs starting at 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(i as PlayerId + 1, format!("Player{}", i + 1), i as u32))
            .collect()
    }

    /// A short black pen stroke starting at (`x`, `y`).
    pub fn stroke_at(x: f32, y: f32) -> Stroke {
        Stroke {
            x0: x,
            y0: y,
            x1: x + 10.0,
            y1: y + 10.0,
            color: "#000000".to_string(),
            size: 6.0,
            tool: Tool::Pen,
        }
    }
}
