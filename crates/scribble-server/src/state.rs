use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Mutex;

use scribble_core::player::PlayerId;

use crate::config::ServerConfig;
use crate::gallery::SharedGallery;
use crate::game_loop::{LobbySender, spawn_lobby};

pub type IpConnections = Arc<Mutex<HashMap<IpAddr, usize>>>;

#[derive(Clone)]
pub struct AppState {
    pub lobby: LobbySender,
    pub gallery: SharedGallery,
    pub config: Arc<ServerConfig>,
    pub ws_connection_count: Arc<AtomicUsize>,
    pub ws_per_ip: IpConnections,
    next_player_id: Arc<AtomicU64>,
}

impl AppState {
    /// Build the state and spawn the lobby task it talks to.
    pub fn new(config: ServerConfig, gallery: SharedGallery) -> Self {
        let (lobby, _handle) = spawn_lobby(&config, Arc::clone(&gallery));
        Self {
            lobby,
            gallery,
            config: Arc::new(config),
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            ws_per_ip: Arc::new(Mutex::new(HashMap::new())),
            next_player_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate the id for a new connection. Ids are never reused.
    pub fn next_player_id(&self) -> PlayerId {
        self.next_player_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Counts one live WebSocket for as long as it is held.
pub struct ConnectionGuard {
    count: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self { count }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Holds one of an IP's connection slots.
pub struct IpConnectionGuard {
    ip: IpAddr,
    map: IpConnections,
}

impl IpConnectionGuard {
    /// Take a slot for `ip`, or `None` if it already holds `max`.
    pub async fn try_acquire(ip: IpAddr, map: IpConnections, max: usize) -> Option<Self> {
        {
            let mut counts = map.lock().await;
            let count = counts.entry(ip).or_insert(0);
            if *count >= max {
                return None;
            }
            *count += 1;
        }
        Some(Self { ip, map })
    }
}

impl Drop for IpConnectionGuard {
    fn drop(&mut self) {
        let ip = self.ip;
        let map = Arc::clone(&self.map);
        // Drop cannot await; release the slot on the runtime.
        tokio::spawn(async move {
            let mut counts = map.lock().await;
            if let Some(count) = counts.get_mut(&ip) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(&ip);
                }
            }
        });
    }
}
