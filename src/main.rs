//! Ticket Timer - per-ticket session timers for time tracking
//! 
//! This is the main entry point for the ticket-timer service.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use ticket_timer::{
    config::Config,
    state::AppState,
    api::create_router,
    tasks::{relay_log_task, TickDriver},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("ticket_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting ticket-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms",
          config.host, config.port, config.tick_ms);

    // Create application state
    let state = Arc::new(AppState::new(config.port, config.host.clone(), config.tick_interval()));

    // Start the tick driver and the relay task
    let mut tick_driver = TickDriver::new();
    tick_driver.spawn(Arc::clone(&state));

    let relay_state = Arc::clone(&state);
    tokio::spawn(async move {
        relay_log_task(relay_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /signal/{{start,pause,resume,stop}}           - Relayed signal");
    info!("  POST /timers/:ticket/{{start,pause,resume,hold,complete,stop}} - Local action");
    info!("  POST /tickets/metadata - Backfill ticket names");
    info!("  GET  /timers           - Registry snapshot");
    info!("  GET  /timers/:ticket   - One timer");
    info!("  GET  /status           - Service status");
    info!("  GET  /health           - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    tick_driver.cancel();
    info!("Server shutdown complete");
    Ok(())
}
