use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use scribble_core::player::PlayerId;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The drawer's image was appended to the room's artifacts.
    Stored,
    /// Timed out, drawer left, or the payload was rejected.
    Missing,
}

/// One-shot race between the drawer's screenshot and a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    Pending { drawer: PlayerId },
    Settled(HandoffOutcome),
}

impl Handoff {
    pub fn pending(drawer: PlayerId) -> Self {
        Self::Pending { drawer }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Whether `player` may still submit for this handoff.
    pub fn accepts(&self, player: PlayerId) -> bool {
        matches!(self, Self::Pending { drawer } if *drawer == player)
    }

    /// Settle the handoff. Returns false if it was already settled.
    pub fn settle(&mut self, outcome: HandoffOutcome) -> bool {
        if !self.is_pending() {
            return false;
        }
        *self = Self::Settled(outcome);
        true
    }
}

/// Decode a PNG data URL into raw PNG bytes.
pub fn decode_png_data_url(data: &str) -> Option<Vec<u8>> {
    let body = data.strip_prefix(PNG_DATA_URL_PREFIX)?;
    let bytes = STANDARD.decode(body).ok()?;
    bytes.starts_with(&PNG_SIGNATURE).then_some(bytes)
}

/// A submitted artifact is kept only if it is a PNG data URL no larger than
/// `max_len` bytes.
pub fn is_valid_artifact(data: &str, max_len: usize) -> bool {
    data.len() <= max_len && decode_png_data_url(data).is_some()
}
