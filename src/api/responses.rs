//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{Outcome, Timer};

/// Body of an external signal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRequest {
    pub ticket_number: String,
    #[serde(default)]
    pub ticket_name: Option<String>,
}

/// Optional body of a local action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    #[serde(default)]
    pub ticket_name: Option<String>,
}

/// Response for transition endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<Timer>,
}

impl TransitionResponse {
    /// Create a new transition response
    pub fn new(status: &str, message: String, timer: Option<Timer>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    pub fn from_outcome(op: &str, ticket: &str, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Applied(timer) => Self::new(
                "applied",
                format!("{} applied to {}", op, ticket),
                Some(timer),
            ),
            Outcome::Ignored(reason) => Self::new("ignored", reason.to_string(), None),
        }
    }
}

/// Response for the metadata backfill endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillResponse {
    pub renamed: usize,
}

/// Status response with registry summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timers: usize,
    pub running: usize,
    pub tick_ms: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
