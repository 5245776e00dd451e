//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{debug, error, warn};

use crate::{
    state::{AppSnapshot, TimerState},
    store::StateStore,
};
use super::responses::{HealthResponse, SaveResponse, StatusResponse};

/// Handle GET /api/state - Return the shared snapshot
pub async fn get_state_handler(State(store): State<Arc<StateStore>>) -> Json<AppSnapshot> {
    Json(store.get().await)
}

/// Handle POST /api/state - Replace the shared snapshot
///
/// The body is parsed as JSON regardless of its content type, since
/// exit-time senders do not always label it.
pub async fn post_state_handler(
    State(store): State<Arc<StateStore>>,
    body: Bytes,
) -> Result<Json<SaveResponse>, StatusCode> {
    let snapshot: AppSnapshot = match serde_json::from_slice(&body) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Rejecting state write: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let timers = snapshot.timers.len();
    debug!("State write: {} timers, paused={}", timers, snapshot.is_paused);

    match store.replace(snapshot).await {
        Ok(()) => Ok(Json(SaveResponse::saved(timers))),
        Err(e) => {
            error!("Failed to persist state: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return a summary of the stored state
pub async fn status_handler(State(store): State<Arc<StateStore>>) -> Json<StatusResponse> {
    let snapshot = store.get().await;
    let running = snapshot
        .timers
        .values()
        .filter(|entry| entry.state == TimerState::Cooldown)
        .count();

    Json(StatusResponse {
        is_paused: snapshot.is_paused,
        timer_count: snapshot.timers.len(),
        running,
        uptime: store.uptime(),
        last_write: store.last_write().await,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
