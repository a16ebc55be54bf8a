//! HTTP API module
//! 
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Signals relayed from the companion process
        .route("/signal/:kind", post(signal_handler))
        // Local user actions
        .route("/timers", get(timers_handler))
        .route("/timers/:ticket", get(timer_handler))
        .route("/timers/:ticket/:action", post(action_handler))
        .route("/tickets/metadata", post(metadata_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
