use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use scribble_core::net::messages::{ClientMessage, JoinRoomMsg, JoinRoomResponseMsg, ServerMessage};
use scribble_core::net::protocol::{PROTOCOL_VERSION, decode_server_message, encode_client_message};

use scribble_server::build_app;
use scribble_server::config::{ServerConfig, TimingsConfig};
use scribble_server::gallery::Gallery;
use scribble_server::state::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a test server with default settings.
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    /// Start a test server whose game pauses are a few milliseconds long.
    pub async fn fast() -> Self {
        let config = ServerConfig {
            timings: TimingsConfig {
                choice_timeout_ms: 2_000,
                countdown_ticks: 1,
                countdown_tick_ms: 20,
                reveal_pause_ms: 30,
                screenshot_timeout_ms: 500,
                game_start_delay_ms: 10,
                round_start_delay_ms: 10,
                all_guessed_grace_ms: 10,
            },
            ..ServerConfig::default()
        };
        Self::from_config(config).await
    }

    async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let gallery = Arc::new(RwLock::new(Gallery::in_memory()));
        let (app, state) = build_app(config, gallery);

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Connect a WebSocket client and consume the initial open-rooms listing.
pub async fn ws_connect(url: &str) -> WsStream {
    let (mut stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    match ws_read_server_msg(&mut stream).await {
        ServerMessage::OpenRooms(_) => {},
        other => panic!("Expected OpenRooms, got: {other:?}"),
    }
    stream
}

/// Send a ClientMessage from a WS stream.
pub async fn ws_send_client_msg(stream: &mut WsStream, msg: &ClientMessage) {
    let encoded = encode_client_message(msg).unwrap();
    stream.send(Message::Binary(encoded.into())).await.unwrap();
}

/// Send a JoinRoom and return the JoinRoomResponse, skipping anything before it.
pub async fn ws_join(
    stream: &mut WsStream,
    room_code: Option<&str>,
    name: &str,
) -> JoinRoomResponseMsg {
    let msg = ClientMessage::JoinRoom(JoinRoomMsg {
        player_name: name.to_string(),
        room_code: room_code.map(str::to_string),
        protocol_version: PROTOCOL_VERSION,
    });
    ws_send_client_msg(stream, &msg).await;
    ws_read_until(stream, |m| match m {
        ServerMessage::JoinRoomResponse(join) => Some(join),
        _ => None,
    })
    .await
}

/// Create a room, returning the response and the room code.
pub async fn ws_create_room(stream: &mut WsStream, name: &str) -> (JoinRoomResponseMsg, String) {
    let join = ws_join(stream, None, name).await;
    assert!(join.success, "Expected successful join: {join:?}");
    let code = join.room_code.clone().unwrap();
    (join, code)
}

/// Read raw binary data from a WebSocket stream (5s timeout).
pub async fn ws_read_raw(stream: &mut WsStream) -> Vec<u8> {
    let deadline = Duration::from_secs(5);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return data.to_vec(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Read the next ServerMessage from a WebSocket stream (5s timeout).
pub async fn ws_read_server_msg(stream: &mut WsStream) -> ServerMessage {
    let data = ws_read_raw(stream).await;
    decode_server_message(&data).unwrap()
}

/// Read messages until `pick` returns `Some`, discarding the rest.
pub async fn ws_read_until<T>(
    stream: &mut WsStream,
    mut pick: impl FnMut(ServerMessage) -> Option<T>,
) -> T {
    loop {
        if let Some(found) = pick(ws_read_server_msg(stream).await) {
            return found;
        }
    }
}
