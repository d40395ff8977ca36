use serde::{Deserialize, Serialize};

/// A finished drawing captured at the end of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub word: String,
    pub drawer_name: String,
    pub round: u8,
    /// `data:image/png;base64,...` URL as submitted by the drawer.
    pub image_data: String,
}
