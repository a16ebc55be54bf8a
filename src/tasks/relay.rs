//! Outbound relay background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::state::AppState;

/// Background task that drains outbound relay signals.
///
/// Delivery to the companion process happens outside this service; each
/// signal is logged as structured JSON for whatever transport tails it.
pub async fn relay_log_task(state: Arc<AppState>) {
    info!("Starting relay task");

    let mut relay_rx = state.subscribe_relay();

    loop {
        match relay_rx.recv().await {
            Ok(signal) => match serde_json::to_string(&signal) {
                Ok(payload) => info!(target: "ticket_timer::relay", "{}", payload),
                Err(e) => error!("Failed to encode relay signal: {}", e),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!("Relay task lagged, {} signals dropped", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Relay channel closed, stopping relay task");
                break;
            }
        }
    }
}
