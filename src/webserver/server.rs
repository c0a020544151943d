/// Axum webserver lifecycle: bind, serve, graceful shutdown
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::{
    config::ServerConfig,
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Serve until the shutdown channel flips to `true` (or its sender is dropped)
pub async fn start_server(
    state: Arc<AppState>,
    config: &ServerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::AddrInUse => format!(
            "Failed to bind to {}: Address already in use\n\
             \n\
             Another exporter instance (or another service) is listening on this port.\n\
             Stop it or choose a different port with --port or PORT.",
            addr
        ),
        std::io::ErrorKind::PermissionDenied => format!(
            "Failed to bind to {}: Permission denied\n\
             \n\
             Port {} requires elevated privileges on this system.\n\
             Consider using a port above 1024 or running with appropriate permissions.",
            addr, config.port
        ),
        _ => format!("Failed to bind to {}: {}", addr, e),
    })?;

    logger::info(
        LogTag::Webserver,
        &format!("Listening on http://{}", addr),
    );

    let app = build_app(state);

    let shutdown_signal = async move {
        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "Webserver stopped gracefully");
    Ok(())
}

fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state)
}
