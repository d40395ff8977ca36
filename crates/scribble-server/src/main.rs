use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use scribble_server::config::ServerConfig;
use scribble_server::gallery::Gallery;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(format: &str) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    // Config decides the log format, so loading logs through a plain
    // subscriber scoped to this call.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, ServerConfig::load);
    init_tracing(&config.log_format);
    config.validate();

    let gallery = match config.gallery.path.as_deref() {
        Some(path) => match Gallery::open(path) {
            Ok(g) => g,
            Err(e) => {
                tracing::error!(path, "Failed to open gallery: {e}");
                std::process::exit(1);
            },
        },
        None => {
            tracing::info!("No gallery path configured, drawings kept in memory");
            Gallery::in_memory()
        },
    };

    let listen_addr = config.listen_addr.clone();
    let (app, _state) = scribble_server::build_app(config, Arc::new(RwLock::new(gallery)));

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%listen_addr, "Failed to bind: {e}");
            std::process::exit(1);
        },
    };
    tracing::info!(%listen_addr, "Scribble server listening");

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!("Server error: {e}");
    }
    tracing::info!("Scribble server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
