use super::{error_response, exposition};
use crate::logger::{self, LogTag};
use crate::metrics::render_steam;
use crate::poller::Entity;
use crate::webserver::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;

pub const STEAM_DISABLED_MESSAGE: &str =
    "Steam collector not initialized - STEAM_KEY environment variable is required";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/metrics/steam/:steam_id", get(steam_metrics))
}

/// GET /metrics/steam/:steam_id
async fn steam_metrics(
    State(state): State<Arc<AppState>>,
    Path(steam_id): Path<String>,
) -> Response {
    let start = Instant::now();
    logger::info(
        LogTag::Webserver,
        &format!("Steam metrics request steam_id={}", steam_id),
    );

    let Some(steam) = &state.steam else {
        logger::error(LogTag::Webserver, "Steam metrics requested without an API key");
        return (StatusCode::INTERNAL_SERVER_ERROR, STEAM_DISABLED_MESSAGE).into_response();
    };

    match steam.collect(&steam_id).await {
        Ok(snapshot) => {
            state.register(Entity::Steam(steam_id.clone()));
            logger::info(
                LogTag::Webserver,
                &format!(
                    "Steam metrics served steam_id={} games={} stale={} elapsed_ms={}",
                    steam_id,
                    snapshot.games.len(),
                    snapshot.served_stale,
                    start.elapsed().as_millis()
                ),
            );
            exposition(render_steam(&snapshot))
        }
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!(
                    "Steam metrics failed steam_id={} error={} elapsed_ms={}",
                    steam_id,
                    e,
                    start.elapsed().as_millis()
                ),
            );
            error_response(&e)
        }
    }
}
