//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::utils::now_millis;
use super::{LocalAction, RelaySignal, SignalKind, TicketMetadata, Timer, TimerRegistry, TransitionError};

/// Result of a transition request: applied, or ignored as a no-op
#[derive(Debug, Clone)]
pub enum Outcome {
    Applied(Timer),
    Ignored(TransitionError),
}

/// Shared state handed to the HTTP layer, the tick driver and the relay task
#[derive(Debug)]
pub struct AppState {
    /// All timers, keyed by ticket number
    pub registry: Arc<Mutex<TimerRegistry>>,
    /// Tick driver period and per-tick increment
    pub tick_interval: Duration,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Outbound relay signals for the companion process
    pub relay_tx: broadcast::Sender<RelaySignal>,
    /// Latest registry snapshot, served to `/timers` readers
    pub snapshot_tx: watch::Sender<Vec<Timer>>,
    /// Keep the receiver alive to prevent channel closure
    pub _snapshot_rx: watch::Receiver<Vec<Timer>>,
}

impl AppState {
    /// Create a new AppState with an empty registry
    pub fn new(port: u16, host: String, tick_interval: Duration) -> Self {
        let (relay_tx, _) = broadcast::channel(100);
        let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());

        Self {
            registry: Arc::new(Mutex::new(TimerRegistry::new())),
            tick_interval,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            relay_tx,
            snapshot_tx,
            _snapshot_rx: snapshot_rx,
        }
    }

    /// Lock the registry, apply `op`, and publish the new snapshot.
    ///
    /// `op` and the snapshot publish both run under the lock, so readers
    /// and relay subscribers see changes in the order they were applied.
    fn with_registry<T, F>(&self, op: F) -> Result<T, String>
    where
        F: FnOnce(&mut TimerRegistry) -> T,
    {
        let mut registry = self.registry.lock()
            .map_err(|e| format!("Failed to lock timer registry: {}", e))?;

        let result = op(&mut *registry);

        // send_replace never fails, even with no receivers left
        self.snapshot_tx.send_replace(registry.snapshot());
        Ok(result)
    }

    fn record_action(&self, action: String) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action);
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Apply a user-triggered transition and relay it on success
    pub fn local_action(
        &self,
        action: LocalAction,
        ticket_number: &str,
        ticket_name: Option<&str>,
    ) -> Result<Outcome, String> {
        self.local_action_at(action, ticket_number, ticket_name, now_millis())
    }

    pub fn local_action_at(
        &self,
        action: LocalAction,
        ticket_number: &str,
        ticket_name: Option<&str>,
        now: i64,
    ) -> Result<Outcome, String> {
        let result = self.with_registry(|registry| {
            let (timer, signal) = registry.apply_local(action, ticket_number, ticket_name, now)?;
            let timer = timer.clone();

            // Relay while the lock is held so signals follow transition order.
            // No subscribers just means nobody is relaying right now.
            if let Err(e) = self.relay_tx.send(signal) {
                debug!("No relay subscribers for {:?}", e.0.kind);
            }
            Ok::<_, TransitionError>(timer)
        })?;

        match result {
            Ok(timer) => {
                info!("Local {} applied to {}", action.as_str(), ticket_number);
                self.record_action(format!("{} {}", action.as_str(), ticket_number));
                Ok(Outcome::Applied(timer))
            }
            Err(e) => {
                debug!("Ignoring local {}: {}", action.as_str(), e);
                Ok(Outcome::Ignored(e))
            }
        }
    }

    /// Apply a signal received from the companion process
    pub fn external_signal(
        &self,
        kind: SignalKind,
        ticket_number: &str,
        ticket_name: Option<&str>,
    ) -> Result<Outcome, String> {
        self.external_signal_at(kind, ticket_number, ticket_name, now_millis())
    }

    pub fn external_signal_at(
        &self,
        kind: SignalKind,
        ticket_number: &str,
        ticket_name: Option<&str>,
        now: i64,
    ) -> Result<Outcome, String> {
        let result = self.with_registry(|registry| {
            registry
                .apply_signal(kind, ticket_number, ticket_name, now)
                .map(|timer| timer.clone())
        })?;

        match result {
            Ok(timer) => {
                info!("Signal {} applied to {}", kind.as_str(), ticket_number);
                self.record_action(format!("signal-{} {}", kind.as_str(), ticket_number));
                Ok(Outcome::Applied(timer))
            }
            Err(e) => {
                debug!("Ignoring signal {}: {}", kind.as_str(), e);
                Ok(Outcome::Ignored(e))
            }
        }
    }

    /// Backfill placeholder ticket names from resolved metadata
    pub fn backfill_names(&self, metadata: &[TicketMetadata]) -> Result<usize, String> {
        let renamed = self.with_registry(|registry| registry.backfill_names(metadata))?;
        if renamed > 0 {
            info!("Backfilled {} ticket names", renamed);
        }
        Ok(renamed)
    }

    /// Advance every running timer by one tick interval
    pub fn tick(&self) -> Result<usize, String> {
        let step_ms = self.tick_ms();
        let mut registry = self.registry.lock()
            .map_err(|e| format!("Failed to lock timer registry: {}", e))?;

        let advanced = registry.tick(step_ms);
        if advanced > 0 {
            self.snapshot_tx.send_replace(registry.snapshot());
        }
        Ok(advanced)
    }

    /// Tick interval in whole milliseconds, saturating at `u64::MAX`
    pub fn tick_ms(&self) -> u64 {
        u64::try_from(self.tick_interval.as_millis()).unwrap_or(u64::MAX)
    }

    /// Get one timer by ticket number
    pub fn get_timer(&self, ticket_number: &str) -> Result<Option<Timer>, String> {
        self.registry.lock()
            .map(|registry| registry.get(ticket_number).cloned())
            .map_err(|e| format!("Failed to lock timer registry: {}", e))
    }

    /// Get (total, running) timer counts
    pub fn get_counts(&self) -> Result<(usize, usize), String> {
        self.registry.lock()
            .map(|registry| (registry.len(), registry.running_count()))
            .map_err(|e| format!("Failed to lock timer registry: {}", e))
    }

    /// Subscribe to outbound relay signals
    pub fn subscribe_relay(&self) -> broadcast::Receiver<RelaySignal> {
        self.relay_tx.subscribe()
    }

    /// Latest published snapshot in insertion order, read without taking
    /// the registry lock
    pub fn latest_snapshot(&self) -> Vec<Timer> {
        self.snapshot_tx.borrow().clone()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
