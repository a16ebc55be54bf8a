//! Ticket Timer - per-ticket session timers for time tracking
//! 
//! This library tracks time against external tickets. Each ticket owns a
//! timer with an append-only session log; timers change state through local
//! user actions or signals relayed from a companion process, and a tick
//! driver advances every running timer once per interval.

pub mod config;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, Timer, TimerRegistry};
pub use api::create_router;
pub use tasks::TickDriver;
pub use utils::signals::shutdown_signal;
