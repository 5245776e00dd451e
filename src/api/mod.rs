//! HTTP API module
//!
//! This module contains the state endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{store::StateStore, sync::client::STATE_PATH};
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(store: Arc<StateStore>) -> Router {
    Router::new()
        .route(STATE_PATH, get(get_state_handler).post(post_state_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
