use crate::errors::AcquisitionError;
use crate::metrics;
use crate::webserver::{state::AppState, templates};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub mod osrs;
pub mod steam;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/healthz", get(health_check))
        .route("/metrics", get(exporter_metrics))
        .merge(steam::routes())
        .merge(osrs::routes())
        .with_state(state)
}

/// GET /
async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(templates::index_page(state.steam.is_some()))
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub steam_enabled: bool,
    pub tracked_entities: usize,
}

/// GET /healthz
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        steam_enabled: state.steam.is_some(),
        tracked_entities: state.tracked_entities(),
    })
}

/// GET /metrics
async fn exporter_metrics(State(state): State<Arc<AppState>>) -> Response {
    exposition(state.metrics.render())
}

/// Text exposition body with the Prometheus content type
pub(crate) fn exposition(rendered: Result<String, prometheus::Error>) -> Response {
    match rendered {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, metrics::content_type())],
            body,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        )
            .into_response(),
    }
}

/// Status for a collection that failed with no fallback
pub(crate) fn status_for(err: &AcquisitionError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_rate_limited() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::BAD_GATEWAY
    }
}

pub(crate) fn error_response(err: &AcquisitionError) -> Response {
    (status_for(err), err.to_string()).into_response()
}
