use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::game_loop::LobbyCommand;
use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: ConnectionInfo,
    pub rooms: RoomInfo,
    pub gallery: GalleryInfo,
}

#[derive(Serialize)]
pub struct ConnectionInfo {
    pub websocket: usize,
}

#[derive(Serialize)]
pub struct RoomInfo {
    pub active: usize,
    pub players: usize,
}

#[derive(Serialize)]
pub struct GalleryInfo {
    pub drawings: usize,
}

/// Returns server status, connection counts, and room info as JSON. Reports
/// `degraded` when the lobby task does not answer.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ws = state.ws_connection_count.load(Ordering::Relaxed);

    let (reply, rx) = oneshot::channel();
    let stats = match state.lobby.send(LobbyCommand::Stats { reply }) {
        Ok(()) => rx.await.ok(),
        Err(_) => None,
    };
    let drawings = state.gallery.read().await.len();

    Json(HealthResponse {
        status: if stats.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        connections: ConnectionInfo { websocket: ws },
        rooms: RoomInfo {
            active: stats.map_or(0, |s| s.rooms),
            players: stats.map_or(0, |s| s.players),
        },
        gallery: GalleryInfo { drawings },
    })
}
