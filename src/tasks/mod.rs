//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod tick_driver;
pub mod relay;

// Re-export main types
pub use tick_driver::TickDriver;
pub use relay::relay_log_task;
