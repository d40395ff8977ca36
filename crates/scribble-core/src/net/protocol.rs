use serde::{Deserialize, Serialize};

use super::messages::{
    ChatMsg, ChooseWordMsg, ClearCanvasMsg, ClientMessage, ConfigUpdatedMsg, CountdownMsg,
    DrawerChoosingMsg, GameEndMsg, GameStartingMsg, GuessResultMsg, HostChangedMsg,
    JoinRoomMsg, JoinRoomResponseMsg, ListOpenRoomsMsg, MessageType, OpenRoomsMsg, PlayAgainMsg,
    PlayerGuessedMsg, PlayerJoinedMsg, PlayerLeftMsg, RoomResetMsg, RoundStartMsg,
    ServerMessage, StartGameMsg, StrokeMsg, SubmitArtifactMsg, SubmitGuessMsg, TimerUpdateMsg,
    TurnEndMsg, TurnStartMsg, UpdateConfigMsg, WordChoicesMsg,
};

/// Current protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Maximum message size in bytes, including the type prefix. Sized for a
/// PNG data URL artifact.
pub const MAX_MESSAGE_SIZE: usize = 512 * 1024; // 512 KiB

#[derive(Debug)]
pub enum ProtocolError {
    EmptyMessage,
    UnknownMessageType(u8),
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyMessage => write!(f, "empty message"),
            Self::UnknownMessageType(b) => write!(f, "unknown message type: 0x{b:02x}"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_MESSAGE_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Encode a serializable payload with a 1-byte type prefix.
pub fn encode_message<T: Serialize>(
    msg_type: MessageType,
    payload: &T,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_bytes =
        rmp_serde::to_vec(payload).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
    let total = 1 + payload_bytes.len();
    if total > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(total));
    }
    let mut buf = Vec::with_capacity(total);
    buf.push(msg_type as u8);
    buf.extend_from_slice(&payload_bytes);
    Ok(buf)
}

/// Encode a `ClientMessage` to wire format.
pub fn encode_client_message(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ClientMessage::JoinRoom(m) => encode_message(MessageType::JoinRoom, m),
        ClientMessage::UpdateConfig(m) => encode_message(MessageType::UpdateConfig, m),
        ClientMessage::StartGame(m) => encode_message(MessageType::StartGame, m),
        ClientMessage::ChooseWord(m) => encode_message(MessageType::ChooseWord, m),
        ClientMessage::DrawStroke(m) => encode_message(MessageType::DrawStroke, m),
        ClientMessage::ClearCanvas(m) => encode_message(MessageType::ClearCanvas, m),
        ClientMessage::SubmitGuess(m) => encode_message(MessageType::SubmitGuess, m),
        ClientMessage::SubmitArtifact(m) => encode_message(MessageType::SubmitArtifact, m),
        ClientMessage::PlayAgain(m) => encode_message(MessageType::PlayAgain, m),
        ClientMessage::ListOpenRooms(m) => encode_message(MessageType::ListOpenRooms, m),
    }
}

/// Encode a `ServerMessage` to wire format.
pub fn encode_server_message(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    match msg {
        ServerMessage::JoinRoomResponse(m) => encode_message(MessageType::JoinRoomResponse, m),
        ServerMessage::PlayerJoined(m) => encode_message(MessageType::PlayerJoined, m),
        ServerMessage::PlayerLeft(m) => encode_message(MessageType::PlayerLeft, m),
        ServerMessage::HostChanged(m) => encode_message(MessageType::HostChanged, m),
        ServerMessage::ConfigUpdated(m) => encode_message(MessageType::ConfigUpdated, m),
        ServerMessage::OpenRooms(m) => encode_message(MessageType::OpenRooms, m),
        ServerMessage::Chat(m) => encode_message(MessageType::Chat, m),
        ServerMessage::GameStarting(m) => encode_message(MessageType::GameStarting, m),
        ServerMessage::RoundStart(m) => encode_message(MessageType::RoundStart, m),
        ServerMessage::DrawerChoosing(m) => encode_message(MessageType::DrawerChoosing, m),
        ServerMessage::WordChoices(m) => encode_message(MessageType::WordChoices, m),
        ServerMessage::TurnStart(m) => encode_message(MessageType::TurnStart, m.as_ref()),
        ServerMessage::Countdown(m) => encode_message(MessageType::Countdown, m),
        ServerMessage::StrokeRelay(m) => encode_message(MessageType::StrokeRelay, m),
        ServerMessage::CanvasCleared(m) => encode_message(MessageType::CanvasCleared, m),
        ServerMessage::TimerUpdate(m) => encode_message(MessageType::TimerUpdate, m),
        ServerMessage::GuessResult(m) => encode_message(MessageType::GuessResult, m),
        ServerMessage::PlayerGuessed(m) => encode_message(MessageType::PlayerGuessed, m),
        ServerMessage::TurnEnd(m) => encode_message(MessageType::TurnEnd, m),
        ServerMessage::GameEnd(m) => encode_message(MessageType::GameEnd, m),
        ServerMessage::RoomReset(m) => encode_message(MessageType::RoomReset, m),
    }
}

/// Extract the message type byte from raw wire data.
pub fn decode_message_type(data: &[u8]) -> Result<MessageType, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    MessageType::from_byte(data[0]).ok_or(ProtocolError::UnknownMessageType(data[0]))
}

/// Decode a MessagePack payload (bytes after the type prefix).
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    rmp_serde::from_slice(&data[1..]).map_err(|e| ProtocolError::DeserializeError(e.to_string()))
}

/// Decode raw wire data into a `ClientMessage`.
pub fn decode_client_message(data: &[u8]) -> Result<ClientMessage, ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(data.len()));
    }
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::JoinRoom => Ok(ClientMessage::JoinRoom(decode_payload::<JoinRoomMsg>(
            data,
        )?)),
        MessageType::UpdateConfig => Ok(ClientMessage::UpdateConfig(decode_payload::<
            UpdateConfigMsg,
        >(data)?)),
        MessageType::StartGame => Ok(ClientMessage::StartGame(decode_payload::<StartGameMsg>(
            data,
        )?)),
        MessageType::ChooseWord => Ok(ClientMessage::ChooseWord(decode_payload::<ChooseWordMsg>(
            data,
        )?)),
        MessageType::DrawStroke => Ok(ClientMessage::DrawStroke(decode_payload::<StrokeMsg>(
            data,
        )?)),
        MessageType::ClearCanvas => Ok(ClientMessage::ClearCanvas(
            decode_payload::<ClearCanvasMsg>(data)?,
        )),
        MessageType::SubmitGuess => Ok(ClientMessage::SubmitGuess(
            decode_payload::<SubmitGuessMsg>(data)?,
        )),
        MessageType::SubmitArtifact => Ok(ClientMessage::SubmitArtifact(decode_payload::<
            SubmitArtifactMsg,
        >(data)?)),
        MessageType::PlayAgain => Ok(ClientMessage::PlayAgain(decode_payload::<PlayAgainMsg>(
            data,
        )?)),
        MessageType::ListOpenRooms => Ok(ClientMessage::ListOpenRooms(decode_payload::<
            ListOpenRoomsMsg,
        >(data)?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

/// Decode raw wire data into a `ServerMessage`.
pub fn decode_server_message(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let msg_type = decode_message_type(data)?;
    match msg_type {
        MessageType::JoinRoomResponse => Ok(ServerMessage::JoinRoomResponse(decode_payload::<
            JoinRoomResponseMsg,
        >(data)?)),
        MessageType::PlayerJoined => Ok(ServerMessage::PlayerJoined(decode_payload::<
            PlayerJoinedMsg,
        >(data)?)),
        MessageType::PlayerLeft => Ok(ServerMessage::PlayerLeft(decode_payload::<PlayerLeftMsg>(
            data,
        )?)),
        MessageType::HostChanged => Ok(ServerMessage::HostChanged(
            decode_payload::<HostChangedMsg>(data)?,
        )),
        MessageType::ConfigUpdated => Ok(ServerMessage::ConfigUpdated(decode_payload::<
            ConfigUpdatedMsg,
        >(data)?)),
        MessageType::OpenRooms => Ok(ServerMessage::OpenRooms(decode_payload::<OpenRoomsMsg>(
            data,
        )?)),
        MessageType::Chat => Ok(ServerMessage::Chat(decode_payload::<ChatMsg>(data)?)),
        MessageType::GameStarting => Ok(ServerMessage::GameStarting(decode_payload::<
            GameStartingMsg,
        >(data)?)),
        MessageType::RoundStart => Ok(ServerMessage::RoundStart(decode_payload::<RoundStartMsg>(
            data,
        )?)),
        MessageType::DrawerChoosing => Ok(ServerMessage::DrawerChoosing(decode_payload::<
            DrawerChoosingMsg,
        >(data)?)),
        MessageType::WordChoices => Ok(ServerMessage::WordChoices(
            decode_payload::<WordChoicesMsg>(data)?,
        )),
        MessageType::TurnStart => Ok(ServerMessage::TurnStart(Box::new(decode_payload::<
            TurnStartMsg,
        >(data)?))),
        MessageType::Countdown => Ok(ServerMessage::Countdown(decode_payload::<CountdownMsg>(
            data,
        )?)),
        MessageType::StrokeRelay => Ok(ServerMessage::StrokeRelay(decode_payload::<StrokeMsg>(
            data,
        )?)),
        MessageType::CanvasCleared => Ok(ServerMessage::CanvasCleared(decode_payload::<
            ClearCanvasMsg,
        >(data)?)),
        MessageType::TimerUpdate => Ok(ServerMessage::TimerUpdate(
            decode_payload::<TimerUpdateMsg>(data)?,
        )),
        MessageType::GuessResult => Ok(ServerMessage::GuessResult(
            decode_payload::<GuessResultMsg>(data)?,
        )),
        MessageType::PlayerGuessed => Ok(ServerMessage::PlayerGuessed(decode_payload::<
            PlayerGuessedMsg,
        >(data)?)),
        MessageType::TurnEnd => Ok(ServerMessage::TurnEnd(decode_payload::<TurnEndMsg>(data)?)),
        MessageType::GameEnd => Ok(ServerMessage::GameEnd(decode_payload::<GameEndMsg>(data)?)),
        MessageType::RoomReset => Ok(ServerMessage::RoomReset(decode_payload::<RoomResetMsg>(
            data,
        )?)),
        _ => Err(ProtocolError::UnknownMessageType(data[0])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;
    use crate::net::messages::{ChatKind, OpenRoomEntry, PlayerScoreEntry};
    use crate::player::Player;
    use crate::room::RoomConfig;
    use crate::stroke::{Stroke, Tool};

    fn test_player() -> Player {
        Player::new(42, "Alice".to_string(), 0)
    }

    fn test_stroke() -> Stroke {
        Stroke {
            x0: 1.0,
            y0: 2.0,
            x1: 3.5,
            y1: 4.5,
            color: "#ff00ff".to_string(),
            size: 8.0,
            tool: Tool::Eraser,
        }
    }

    #[test]
    fn roundtrip_join_room() {
        let msg = ClientMessage::JoinRoom(JoinRoomMsg {
            player_name: "Alice".to_string(),
            room_code: Some("AB12".to_string()),
            protocol_version: PROTOCOL_VERSION,
        });
        let encoded = encode_client_message(&msg).unwrap();
        assert_eq!(encoded[0], MessageType::JoinRoom as u8);
        let decoded = decode_client_message(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn roundtrip_draw_stroke() {
        let msg = ClientMessage::DrawStroke(StrokeMsg {
            stroke: test_stroke(),
        });
        let encoded = encode_client_message(&msg).unwrap();
        let decoded = decode_client_message(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn roundtrip_empty_payload_messages() {
        for msg in [
            ClientMessage::StartGame(StartGameMsg {}),
            ClientMessage::ClearCanvas(ClearCanvasMsg {}),
            ClientMessage::PlayAgain(PlayAgainMsg {}),
            ClientMessage::ListOpenRooms(ListOpenRoomsMsg {}),
        ] {
            let encoded = encode_client_message(&msg).unwrap();
            let decoded = decode_client_message(&encoded).unwrap();
            assert_eq!(msg, decoded);
        }
    }

    #[test]
    fn roundtrip_turn_start() {
        let msg = ServerMessage::TurnStart(Box::new(TurnStartMsg {
            drawer_id: 1,
            drawer_name: "Alice".to_string(),
            word: None,
            hint: "_ _ _".to_string(),
            is_drawer: false,
            time_limit_secs: 80,
            round: 1,
            total_rounds: 3,
            strokes: vec![test_stroke()],
            players: vec![test_player()],
        }));
        let encoded = encode_server_message(&msg).unwrap();
        let decoded = decode_server_message(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn roundtrip_game_end() {
        let msg = ServerMessage::GameEnd(GameEndMsg {
            final_scores: vec![PlayerScoreEntry {
                player_id: 1,
                player_name: "Alice".to_string(),
                score: 950,
            }],
            artifacts: vec![Artifact {
                word: "cat".to_string(),
                drawer_name: "Alice".to_string(),
                round: 1,
                image_data: "data:image/png;base64,AAAA".to_string(),
            }],
        });
        let encoded = encode_server_message(&msg).unwrap();
        let decoded = decode_server_message(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn roundtrip_open_rooms_and_chat() {
        let rooms = ServerMessage::OpenRooms(OpenRoomsMsg {
            rooms: vec![OpenRoomEntry {
                code: "AB12".to_string(),
                host_name: "Alice".to_string(),
                player_count: 2,
                config: RoomConfig::default(),
            }],
        });
        let chat = ServerMessage::Chat(ChatMsg {
            sender: "Game".to_string(),
            text: "You're close!".to_string(),
            kind: ChatKind::Close,
        });
        for msg in [rooms, chat] {
            let encoded = encode_server_message(&msg).unwrap();
            assert_eq!(decode_server_message(&encoded).unwrap(), msg);
        }
    }

    #[test]
    fn empty_data_is_error() {
        assert!(matches!(
            decode_client_message(&[]),
            Err(ProtocolError::EmptyMessage)
        ));
        assert!(matches!(
            decode_server_message(&[]),
            Err(ProtocolError::EmptyMessage)
        ));
    }

    #[test]
    fn unknown_type_is_error() {
        assert!(matches!(
            decode_client_message(&[0xFF, 0x00]),
            Err(ProtocolError::UnknownMessageType(0xFF))
        ));
    }

    #[test]
    fn direction_mismatch_is_rejected() {
        let server = encode_server_message(&ServerMessage::Countdown(CountdownMsg { count: 3 }))
            .unwrap();
        assert!(matches!(
            decode_client_message(&server),
            Err(ProtocolError::UnknownMessageType(_))
        ));

        let client =
            encode_client_message(&ClientMessage::StartGame(StartGameMsg {})).unwrap();
        assert!(matches!(
            decode_server_message(&client),
            Err(ProtocolError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn truncated_payload_is_error() {
        let msg = ClientMessage::SubmitGuess(SubmitGuessMsg {
            text: "elephant".to_string(),
        });
        let encoded = encode_client_message(&msg).unwrap();
        let truncated = &encoded[..encoded.len() - 3];
        assert!(matches!(
            decode_client_message(truncated),
            Err(ProtocolError::DeserializeError(_))
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let msg = ClientMessage::SubmitArtifact(SubmitArtifactMsg {
            image_data: "A".repeat(MAX_MESSAGE_SIZE),
        });
        assert!(matches!(
            encode_client_message(&msg),
            Err(ProtocolError::PayloadTooLarge(_))
        ));
    }
}
