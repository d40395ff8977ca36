use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::player::{Player, PlayerId};
use crate::room::RoomConfig;
use crate::stroke::Stroke;

/// Network message type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Client -> Server
    JoinRoom = 0x01,
    UpdateConfig = 0x02,
    StartGame = 0x03,
    ChooseWord = 0x04,
    DrawStroke = 0x05,
    ClearCanvas = 0x06,
    SubmitGuess = 0x07,
    SubmitArtifact = 0x08,
    PlayAgain = 0x09,
    ListOpenRooms = 0x0A,

    // Server -> Client (lobby)
    JoinRoomResponse = 0x10,
    PlayerJoined = 0x11,
    PlayerLeft = 0x12,
    HostChanged = 0x13,
    ConfigUpdated = 0x14,
    OpenRooms = 0x15,
    Chat = 0x16,

    // Server -> Client (game)
    GameStarting = 0x20,
    RoundStart = 0x21,
    DrawerChoosing = 0x22,
    WordChoices = 0x23,
    TurnStart = 0x24,
    Countdown = 0x25,
    StrokeRelay = 0x26,
    CanvasCleared = 0x27,
    TimerUpdate = 0x28,
    GuessResult = 0x29,
    PlayerGuessed = 0x2A,
    TurnEnd = 0x2B,
    GameEnd = 0x2C,
    RoomReset = 0x2D,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::JoinRoom),
            0x02 => Some(Self::UpdateConfig),
            0x03 => Some(Self::StartGame),
            0x04 => Some(Self::ChooseWord),
            0x05 => Some(Self::DrawStroke),
            0x06 => Some(Self::ClearCanvas),
            0x07 => Some(Self::SubmitGuess),
            0x08 => Some(Self::SubmitArtifact),
            0x09 => Some(Self::PlayAgain),
            0x0A => Some(Self::ListOpenRooms),
            0x10 => Some(Self::JoinRoomResponse),
            0x11 => Some(Self::PlayerJoined),
            0x12 => Some(Self::PlayerLeft),
            0x13 => Some(Self::HostChanged),
            0x14 => Some(Self::ConfigUpdated),
            0x15 => Some(Self::OpenRooms),
            0x16 => Some(Self::Chat),
            0x20 => Some(Self::GameStarting),
            0x21 => Some(Self::RoundStart),
            0x22 => Some(Self::DrawerChoosing),
            0x23 => Some(Self::WordChoices),
            0x24 => Some(Self::TurnStart),
            0x25 => Some(Self::Countdown),
            0x26 => Some(Self::StrokeRelay),
            0x27 => Some(Self::CanvasCleared),
            0x28 => Some(Self::TimerUpdate),
            0x29 => Some(Self::GuessResult),
            0x2A => Some(Self::PlayerGuessed),
            0x2B => Some(Self::TurnEnd),
            0x2C => Some(Self::GameEnd),
            0x2D => Some(Self::RoomReset),
            _ => None,
        }
    }

    /// Whether this type travels client -> server.
    pub fn is_client(self) -> bool {
        (self as u8) < 0x10
    }
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    JoinRoom(JoinRoomMsg),
    UpdateConfig(UpdateConfigMsg),
    StartGame(StartGameMsg),
    ChooseWord(ChooseWordMsg),
    DrawStroke(StrokeMsg),
    ClearCanvas(ClearCanvasMsg),
    SubmitGuess(SubmitGuessMsg),
    SubmitArtifact(SubmitArtifactMsg),
    PlayAgain(PlayAgainMsg),
    ListOpenRooms(ListOpenRoomsMsg),
}

/// Join an existing room by code, or create a new one when `room_code` is
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomMsg {
    pub player_name: String,
    pub room_code: Option<String>,
    pub protocol_version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfigMsg {
    pub config: RoomConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartGameMsg {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChooseWordMsg {
    pub word: String,
}

/// Used both for the drawer's outgoing stroke and the server relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeMsg {
    pub stroke: Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClearCanvasMsg {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitGuessMsg {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitArtifactMsg {
    pub image_data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayAgainMsg {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListOpenRoomsMsg {}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    JoinRoomResponse(JoinRoomResponseMsg),
    PlayerJoined(PlayerJoinedMsg),
    PlayerLeft(PlayerLeftMsg),
    HostChanged(HostChangedMsg),
    ConfigUpdated(ConfigUpdatedMsg),
    OpenRooms(OpenRoomsMsg),
    Chat(ChatMsg),
    GameStarting(GameStartingMsg),
    RoundStart(RoundStartMsg),
    DrawerChoosing(DrawerChoosingMsg),
    WordChoices(WordChoicesMsg),
    TurnStart(Box<TurnStartMsg>),
    Countdown(CountdownMsg),
    StrokeRelay(StrokeMsg),
    CanvasCleared(ClearCanvasMsg),
    TimerUpdate(TimerUpdateMsg),
    GuessResult(GuessResultMsg),
    PlayerGuessed(PlayerGuessedMsg),
    TurnEnd(TurnEndMsg),
    GameEnd(GameEndMsg),
    RoomReset(RoomResetMsg),
}

/// Answer to [`JoinRoomMsg`]. On failure only `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomResponseMsg {
    pub success: bool,
    pub player_id: Option<PlayerId>,
    pub room_code: Option<String>,
    pub players: Vec<Player>,
    pub host_id: Option<PlayerId>,
    pub is_host: bool,
    pub config: Option<RoomConfig>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoinedMsg {
    pub player: Player,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLeftMsg {
    pub player_id: PlayerId,
    pub player_name: String,
    pub players: Vec<Player>,
    /// Set when the departure promoted a new host.
    pub new_host_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostChangedMsg {
    pub host_id: PlayerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdatedMsg {
    pub config: RoomConfig,
}

/// A joinable room as shown in the discovery listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRoomEntry {
    pub code: String,
    pub host_name: String,
    pub player_count: u32,
    pub config: RoomConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRoomsMsg {
    pub rooms: Vec<OpenRoomEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    System,
    Chat,
    Correct,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMsg {
    pub sender: String,
    pub text: String,
    pub kind: ChatKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartingMsg {
    pub players: Vec<Player>,
    pub config: RoomConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStartMsg {
    pub round: u8,
    pub total_rounds: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerChoosingMsg {
    pub drawer_id: PlayerId,
    pub drawer_name: String,
    pub round: u8,
    pub total_rounds: u8,
}

/// Sent to the drawer only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordChoicesMsg {
    pub words: Vec<String>,
    pub choice_timeout_secs: u16,
}

/// Start of the drawing phase. `word` is only present in the drawer's copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnStartMsg {
    pub drawer_id: PlayerId,
    pub drawer_name: String,
    pub word: Option<String>,
    pub hint: String,
    pub is_drawer: bool,
    pub time_limit_secs: u16,
    pub round: u8,
    pub total_rounds: u8,
    /// Strokes already drawn this turn, for late joiners.
    pub strokes: Vec<Stroke>,
    pub players: Vec<Player>,
}

/// Pre-turn countdown tick; `0` means go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownMsg {
    pub count: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerUpdateMsg {
    pub time_left: u16,
}

/// Private answer to a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessResultMsg {
    pub correct: bool,
    pub points: Option<u32>,
}

/// Broadcast when someone guessed correctly. Never carries the word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGuessedMsg {
    pub player_id: PlayerId,
    pub player_name: String,
    pub points: u32,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScoreEntry {
    pub player_id: PlayerId,
    pub player_name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEndMsg {
    pub drawer_id: PlayerId,
    /// `None` when the turn was skipped before a word was chosen.
    pub word: Option<String>,
    pub all_guessed: bool,
    pub players: Vec<Player>,
    /// Score gained by each player over the turn.
    pub deltas: Vec<PlayerScoreEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEndMsg {
    /// Sorted by descending score.
    pub final_scores: Vec<PlayerScoreEntry>,
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomResetMsg {
    pub players: Vec<Player>,
    pub config: RoomConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_byte_matches_discriminants() {
        for b in 0u8..=0xFF {
            if let Some(t) = MessageType::from_byte(b) {
                assert_eq!(t as u8, b);
            }
        }
    }

    #[test]
    fn direction_split() {
        assert!(MessageType::JoinRoom.is_client());
        assert!(MessageType::ListOpenRooms.is_client());
        assert!(!MessageType::JoinRoomResponse.is_client());
        assert!(!MessageType::RoomReset.is_client());
    }
}
