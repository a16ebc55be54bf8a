//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, warn};

use crate::state::{AppState, LocalAction, SignalKind, TicketMetadata, Timer};
use super::responses::{
    ActionRequest, BackfillResponse, HealthResponse, SignalRequest, StatusResponse,
    TransitionResponse,
};

/// Handle POST /signal/:kind - Apply a signal relayed from the companion process
pub async fn signal_handler(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(request): Json<SignalRequest>,
) -> Result<Json<TransitionResponse>, StatusCode> {
    let Some(kind) = SignalKind::from_name(&kind) else {
        warn!("Unknown signal kind: {}", kind);
        return Err(StatusCode::NOT_FOUND);
    };

    match state.external_signal(kind, &request.ticket_number, request.ticket_name.as_deref()) {
        Ok(outcome) => Ok(Json(TransitionResponse::from_outcome(
            kind.as_str(),
            &request.ticket_number,
            outcome,
        ))),
        Err(e) => {
            error!("Failed to apply {} signal: {}", kind.as_str(), e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /timers/:ticket/:action - Apply a local user action
pub async fn action_handler(
    State(state): State<Arc<AppState>>,
    Path((ticket, action)): Path<(String, String)>,
    body: Option<Json<ActionRequest>>,
) -> Result<Json<TransitionResponse>, StatusCode> {
    let Some(action) = LocalAction::from_name(&action) else {
        warn!("Unknown timer action: {}", action);
        return Err(StatusCode::NOT_FOUND);
    };
    let request = body.map(|Json(b)| b).unwrap_or_default();

    match state.local_action(action, &ticket, request.ticket_name.as_deref()) {
        Ok(outcome) => Ok(Json(TransitionResponse::from_outcome(
            action.as_str(),
            &ticket,
            outcome,
        ))),
        Err(e) => {
            error!("Failed to apply {} to {}: {}", action.as_str(), ticket, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /tickets/metadata - Backfill names resolved after creation
pub async fn metadata_handler(
    State(state): State<Arc<AppState>>,
    Json(metadata): Json<Vec<TicketMetadata>>,
) -> Result<Json<BackfillResponse>, StatusCode> {
    match state.backfill_names(&metadata) {
        Ok(renamed) => Ok(Json(BackfillResponse { renamed })),
        Err(e) => {
            error!("Failed to backfill ticket names: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /timers - Return the full registry snapshot
pub async fn timers_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Timer>> {
    Json(state.latest_snapshot())
}

/// Handle GET /timers/:ticket - Return one timer
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
    Path(ticket): Path<String>,
) -> Result<Json<Timer>, StatusCode> {
    match state.get_timer(&ticket) {
        Ok(Some(timer)) => Ok(Json(timer)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to get timer {}: {}", ticket, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /status - Return current service status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let (timers, running) = match state.get_counts() {
        Ok(counts) => counts,
        Err(e) => {
            error!("Failed to get timer counts: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timers,
        running,
        tick_ms: state.tick_ms(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
