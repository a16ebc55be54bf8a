//! State management module
//!
//! This module contains the timer state machine, its session log, the
//! registry that owns all timers and the shared application state.

pub mod session;
pub mod timer;
pub mod registry;
pub mod error;
pub mod app_state;

// Re-export main types
pub use session::{Session, SessionLog, SessionStatus};
pub use timer::{Timer, TimerStatus};
pub use registry::{LocalAction, RelayKind, RelaySignal, SignalKind, TicketMetadata, TimerRegistry};
pub use error::TransitionError;
pub use app_state::{AppState, Outcome};
