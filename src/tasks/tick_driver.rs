//! Tick driver background task

use std::sync::Arc;
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Owns the periodic task that advances running timers.
///
/// The task holds its own handle to the shared state, so replacing or
/// cancelling it is always explicit.
#[derive(Debug, Default)]
pub struct TickDriver {
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking against `state`, replacing any task already running
    pub fn spawn(&mut self, state: Arc<AppState>) {
        self.cancel();
        self.handle = Some(tokio::spawn(tick_loop(state)));
    }

    /// Stop the current task, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Tick driver cancelled");
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Advance every running timer once per tick interval.
///
/// Each tick adds a fixed step, so time the host spends suspended is not
/// counted.
async fn tick_loop(state: Arc<AppState>) {
    info!("Starting tick driver every {:?}", state.tick_interval);

    let mut ticker = interval(state.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; no time has passed yet
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match state.tick() {
            Ok(0) => {}
            Ok(advanced) => debug!("Advanced {} running timers", advanced),
            Err(e) => error!("Failed to advance timers: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::state::{LocalAction, SignalKind};

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(0, "127.0.0.1".to_string(), Duration::from_secs(1)))
    }

    #[tokio::test(start_paused = true)]
    async fn advances_running_timers_once_per_second() {
        let state = state();
        state.external_signal_at(SignalKind::Start, "PROJ-1", None, 0).unwrap();

        let mut driver = TickDriver::new();
        driver.spawn(Arc::clone(&state));
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let timer = state.get_timer("PROJ-1").unwrap().unwrap();
        assert_eq!(timer.total_elapsed, 3_000);
        assert_eq!(timer.elapsed_time, 3_000);
        assert_eq!(timer.sessions.open().map(|s| s.duration), Some(3_000));
    }

    #[tokio::test(start_paused = true)]
    async fn paused_timers_do_not_advance() {
        let state = state();
        state.local_action_at(LocalAction::Start, "PROJ-1", None, 0).unwrap();
        state.local_action_at(LocalAction::Pause, "PROJ-1", None, 0).unwrap();

        let mut driver = TickDriver::new();
        driver.spawn(Arc::clone(&state));
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert_eq!(state.get_timer("PROJ-1").unwrap().unwrap().total_elapsed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_advancing() {
        let state = state();
        state.external_signal_at(SignalKind::Start, "PROJ-1", None, 0).unwrap();

        let mut driver = TickDriver::new();
        driver.spawn(Arc::clone(&state));
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        driver.cancel();
        tokio::time::sleep(Duration::from_millis(5_000)).await;

        assert_eq!(state.get_timer("PROJ-1").unwrap().unwrap().total_elapsed, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn respawn_replaces_previous_task() {
        let state = state();
        state.external_signal_at(SignalKind::Start, "PROJ-1", None, 0).unwrap();

        let mut driver = TickDriver::new();
        driver.spawn(Arc::clone(&state));
        driver.spawn(Arc::clone(&state));
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        // A leaked first task would double count
        assert_eq!(state.get_timer("PROJ-1").unwrap().unwrap().total_elapsed, 2_000);
    }
}
