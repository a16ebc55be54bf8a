//! Rejected transition reasons
//!
//! None of these are fatal. Callers treat every variant as a no-op that
//! leaves the registry untouched.

use thiserror::Error;

use super::TimerStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// A local action other than `start` named a ticket with no timer
    #[error("no timer for ticket {0}")]
    UnknownTicket(String),

    /// An external signal named a ticket with no timer
    #[error("stale signal for unknown ticket {0}")]
    StaleSignal(String),

    /// The timer exists but its current state does not allow the operation
    #[error("cannot {op} a timer that is {status}")]
    InvalidTransition { op: &'static str, status: TimerStatus },
}
