pub mod api;
pub mod config;
pub mod error;
pub mod gallery;
pub mod game;
pub mod game_loop;
pub mod handoff;
pub mod health;
pub mod outbox;
pub mod rate_limit;
pub mod registry;
pub mod room;
pub mod state;
pub mod timers;
pub mod ws;

use axum::Router;
use axum::routing::get;
use tower_http::services::ServeDir;

use config::ServerConfig;
use gallery::SharedGallery;
use state::AppState;

/// Build the Axum router and application state from a config. Spawns the
/// lobby task, so it must run inside a Tokio runtime.
pub fn build_app(config: ServerConfig, gallery: SharedGallery) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    let state = AppState::new(config, gallery);

    let api_routes = Router::new()
        .route("/gallery", get(api::list_gallery))
        .route("/gallery/drawers", get(api::list_drawers))
        .route("/gallery/{id}/image", get(api::gallery_image));

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&web_root))
        .with_state(state.clone());

    (app, state)
}
