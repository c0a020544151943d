use super::{error_response, exposition};
use crate::apis::osrs::{HiscoreMode, UNKNOWN_MODE_MESSAGE};
use crate::logger::{self, LogTag};
use crate::metrics::{render_player, render_worlds};
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

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/metrics/osrs/worlds", get(world_metrics))
        .route("/metrics/osrs/:mode/:player", get(player_metrics))
}

/// GET /metrics/osrs/worlds
async fn world_metrics(State(state): State<Arc<AppState>>) -> Response {
    let start = Instant::now();
    match state.osrs.collect_worlds().await {
        Ok(outcome) => {
            logger::info(
                LogTag::Webserver,
                &format!(
                    "World metrics served worlds={} truncated={} elapsed_ms={}",
                    outcome.records.len(),
                    outcome.truncated,
                    start.elapsed().as_millis()
                ),
            );
            exposition(render_worlds(&outcome.records))
        }
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!("World metrics failed error={}", e),
            );
            error_response(&e)
        }
    }
}

/// GET /metrics/osrs/:mode/:player
async fn player_metrics(
    State(state): State<Arc<AppState>>,
    Path((mode, player)): Path<(String, String)>,
) -> Response {
    let start = Instant::now();
    let Ok(mode) = mode.parse::<HiscoreMode>() else {
        logger::warning(
            LogTag::Webserver,
            &format!("Unknown OSRS mode mode={} player={}", mode, player),
        );
        return (StatusCode::BAD_REQUEST, UNKNOWN_MODE_MESSAGE).into_response();
    };

    logger::info(
        LogTag::Webserver,
        &format!("OSRS metrics request player={} mode={}", player, mode),
    );

    match state.osrs.collect_player(&player, mode).await {
        Ok(stats) => {
            state.register(Entity::Osrs {
                rsn: player.clone(),
                mode,
            });
            logger::info(
                LogTag::Webserver,
                &format!(
                    "OSRS metrics served player={} mode={} elapsed_ms={}",
                    player,
                    mode,
                    start.elapsed().as_millis()
                ),
            );
            exposition(render_player(&stats))
        }
        Err(e) => {
            logger::error(
                LogTag::Webserver,
                &format!(
                    "OSRS metrics failed player={} mode={} error={}",
                    player, mode, e
                ),
            );
            error_response(&e)
        }
    }
}
