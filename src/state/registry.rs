//! Timer registry: ticket number to timer, with signal upsert semantics

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Timer, TransitionError};

/// Outbound notification kinds sent to the companion process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelayKind {
    StartTask,
    PauseTask,
    ResumeTask,
    StopTask,
}

/// One outbound relay message, emitted per applied local transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySignal {
    #[serde(rename = "type")]
    pub kind: RelayKind,
    pub ticket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Ticket metadata used to backfill names of timers created from bare ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMetadata {
    pub ticket_number: String,
    pub ticket_name: String,
}

/// Local user actions on a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalAction {
    Start,
    Pause,
    Resume,
    Hold,
    Complete,
    Stop,
}

impl LocalAction {
    /// Parse the action segment used in request paths
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "pause" => Some(Self::Pause),
            "resume" => Some(Self::Resume),
            "hold" => Some(Self::Hold),
            "complete" => Some(Self::Complete),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Hold => "hold",
            Self::Complete => "complete",
            Self::Stop => "stop",
        }
    }

    fn relay_kind(&self) -> RelayKind {
        match self {
            Self::Start => RelayKind::StartTask,
            Self::Pause | Self::Hold => RelayKind::PauseTask,
            Self::Resume => RelayKind::ResumeTask,
            Self::Complete | Self::Stop => RelayKind::StopTask,
        }
    }
}

/// External signals arriving from the companion process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Start,
    Pause,
    Resume,
    Stop,
}

impl SignalKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "pause" => Some(Self::Pause),
            "resume" => Some(Self::Resume),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }
}

/// Insertion-ordered collection of timers. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    timers: IndexMap<String, Timer>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ticket_number: &str) -> Option<&Timer> {
        self.timers.get(ticket_number)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.timers.values().filter(|t| t.is_running).count()
    }

    /// Ordered copy of every timer for presentation
    pub fn snapshot(&self) -> Vec<Timer> {
        self.timers.values().cloned().collect()
    }

    fn get_or_create(&mut self, ticket_number: &str, ticket_name: Option<&str>) -> &mut Timer {
        self.timers
            .entry(ticket_number.to_string())
            .or_insert_with(|| {
                Timer::new(ticket_number, ticket_name.unwrap_or(ticket_number))
            })
    }

    /// External start: create if needed, then restart the clock segment.
    ///
    /// Last signal wins, even against an already running timer.
    pub fn apply_start_signal(
        &mut self,
        ticket_number: &str,
        ticket_name: Option<&str>,
        now: i64,
    ) -> &Timer {
        let timer = self.get_or_create(ticket_number, ticket_name);
        timer.restart(now);
        timer
    }

    pub fn apply_pause_signal(&mut self, ticket_number: &str, now: i64) -> Result<&Timer, TransitionError> {
        self.apply_existing_signal(ticket_number, |t| t.pause(now))
    }

    pub fn apply_resume_signal(&mut self, ticket_number: &str, now: i64) -> Result<&Timer, TransitionError> {
        self.apply_existing_signal(ticket_number, |t| t.resume(now))
    }

    pub fn apply_stop_signal(&mut self, ticket_number: &str, now: i64) -> Result<&Timer, TransitionError> {
        self.apply_existing_signal(ticket_number, |t| t.stop(now))
    }

    /// Dispatch any external signal by kind
    pub fn apply_signal(
        &mut self,
        kind: SignalKind,
        ticket_number: &str,
        ticket_name: Option<&str>,
        now: i64,
    ) -> Result<&Timer, TransitionError> {
        match kind {
            SignalKind::Start => Ok(self.apply_start_signal(ticket_number, ticket_name, now)),
            SignalKind::Pause => self.apply_pause_signal(ticket_number, now),
            SignalKind::Resume => self.apply_resume_signal(ticket_number, now),
            SignalKind::Stop => self.apply_stop_signal(ticket_number, now),
        }
    }

    fn apply_existing_signal<F>(&mut self, ticket_number: &str, op: F) -> Result<&Timer, TransitionError>
    where
        F: FnOnce(&mut Timer) -> Result<(), TransitionError>,
    {
        let timer = self
            .timers
            .get_mut(ticket_number)
            .ok_or_else(|| TransitionError::StaleSignal(ticket_number.to_string()))?;
        op(&mut *timer)?;
        Ok(&*timer)
    }

    /// Apply a local user action and produce the relay message to send out.
    ///
    /// Only `Start` may create a timer. A rejected start on a brand new
    /// ticket cannot happen, so nothing is inserted on failure.
    pub fn apply_local(
        &mut self,
        action: LocalAction,
        ticket_number: &str,
        ticket_name: Option<&str>,
        now: i64,
    ) -> Result<(&Timer, RelaySignal), TransitionError> {
        let timer = match action {
            LocalAction::Start => self.get_or_create(ticket_number, ticket_name),
            _ => self
                .timers
                .get_mut(ticket_number)
                .ok_or_else(|| TransitionError::UnknownTicket(ticket_number.to_string()))?,
        };

        match action {
            LocalAction::Start => timer.start(now),
            LocalAction::Pause => timer.pause(now),
            LocalAction::Resume => timer.resume(now),
            LocalAction::Hold => timer.hold(now),
            LocalAction::Complete => timer.complete(now),
            LocalAction::Stop => timer.stop(now),
        }?;

        let name = match action {
            LocalAction::Start => Some(timer.ticket_name.clone()),
            _ => None,
        };
        let signal = RelaySignal {
            kind: action.relay_kind(),
            ticket: timer.ticket_number.clone(),
            name,
        };
        Ok((&*timer, signal))
    }

    /// Replace placeholder names with resolved ticket names.
    ///
    /// Returns the number of timers renamed.
    pub fn backfill_names(&mut self, metadata: &[TicketMetadata]) -> usize {
        let mut renamed = 0;
        for meta in metadata {
            if let Some(timer) = self.timers.get_mut(&meta.ticket_number) {
                if timer.has_placeholder_name() && meta.ticket_name != meta.ticket_number {
                    timer.ticket_name = meta.ticket_name.clone();
                    renamed += 1;
                }
            }
        }
        renamed
    }

    /// Advance every running timer by `step_ms`; returns how many advanced
    pub fn tick(&mut self, step_ms: u64) -> usize {
        self.timers
            .values_mut()
            .map(|timer| timer.tick(step_ms))
            .filter(|advanced| *advanced)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SessionStatus, TimerStatus};
    use pretty_assertions::assert_eq;

    #[test]
    fn start_signal_creates_running_timer() {
        let mut registry = TimerRegistry::new();
        let timer = registry.apply_start_signal("PROJ-1", Some("Fix bug"), 0);

        assert_eq!(timer.ticket_name, "Fix bug");
        assert_eq!(timer.status, TimerStatus::Running);
        assert!(timer.is_running);
        assert_eq!(timer.sessions.len(), 1);
    }

    #[test]
    fn start_signal_without_name_uses_ticket_number() {
        let mut registry = TimerRegistry::new();
        let timer = registry.apply_start_signal("PROJ-9", None, 0);
        assert!(timer.has_placeholder_name());
    }

    #[test]
    fn start_signal_restarts_running_timer() {
        let mut registry = TimerRegistry::new();
        registry.apply_start_signal("PROJ-1", None, 0);
        registry.tick(1_000);
        registry.tick(1_000);

        let timer = registry.apply_start_signal("PROJ-1", None, 2_000);
        assert_eq!(timer.sessions.len(), 2);
        assert_eq!(timer.sessions.open_count(), 1);
        assert_eq!(timer.elapsed_time, 0);
        assert_eq!(timer.total_elapsed, 2_000);
        assert_eq!(
            timer.sessions.as_slice()[0].status,
            SessionStatus::RestartedBySignal
        );
    }

    #[test]
    fn start_signal_revives_stopped_timer() {
        let mut registry = TimerRegistry::new();
        registry.apply_start_signal("PROJ-1", None, 0);
        registry.apply_stop_signal("PROJ-1", 500).unwrap();

        let timer = registry.apply_start_signal("PROJ-1", None, 1_000);
        assert_eq!(timer.status, TimerStatus::Running);
        assert_eq!(timer.sessions.len(), 2);
    }

    #[test]
    fn signals_for_unknown_ticket_are_stale() {
        let mut registry = TimerRegistry::new();
        for kind in [SignalKind::Pause, SignalKind::Resume, SignalKind::Stop] {
            let err = registry.apply_signal(kind, "NOPE-1", None, 0).unwrap_err();
            assert_eq!(err, TransitionError::StaleSignal("NOPE-1".to_string()));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn local_actions_emit_one_relay_each() {
        let mut registry = TimerRegistry::new();
        let (_, signal) = registry
            .apply_local(LocalAction::Start, "PROJ-1", Some("Fix bug"), 0)
            .unwrap();
        assert_eq!(
            signal,
            RelaySignal {
                kind: RelayKind::StartTask,
                ticket: "PROJ-1".to_string(),
                name: Some("Fix bug".to_string()),
            }
        );

        let (_, signal) = registry.apply_local(LocalAction::Hold, "PROJ-1", None, 1).unwrap();
        assert_eq!(signal.kind, RelayKind::PauseTask);

        let (_, signal) = registry.apply_local(LocalAction::Resume, "PROJ-1", None, 2).unwrap();
        assert_eq!(signal.kind, RelayKind::ResumeTask);

        let (_, signal) = registry.apply_local(LocalAction::Complete, "PROJ-1", None, 3).unwrap();
        assert_eq!(signal.kind, RelayKind::StopTask);
        assert_eq!(signal.name, None);
    }

    #[test]
    fn local_action_on_unknown_ticket_does_not_create() {
        let mut registry = TimerRegistry::new();
        let err = registry
            .apply_local(LocalAction::Pause, "PROJ-1", None, 0)
            .unwrap_err();
        assert_eq!(err, TransitionError::UnknownTicket("PROJ-1".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn rejected_local_action_leaves_registry_unchanged() {
        let mut registry = TimerRegistry::new();
        registry.apply_local(LocalAction::Start, "PROJ-1", None, 0).unwrap();
        registry.apply_local(LocalAction::Pause, "PROJ-1", None, 0).unwrap();
        let before = registry.snapshot();

        assert!(registry.apply_local(LocalAction::Pause, "PROJ-1", None, 5).is_err());
        assert_eq!(registry.snapshot(), before);
    }

    #[test]
    fn backfill_only_touches_placeholder_names() {
        let mut registry = TimerRegistry::new();
        registry.apply_start_signal("PROJ-1", None, 0);
        registry.apply_start_signal("PROJ-2", Some("Already named"), 0);
        registry.tick(1_000);
        let before = registry.get("PROJ-1").cloned().unwrap();

        let renamed = registry.backfill_names(&[
            TicketMetadata {
                ticket_number: "PROJ-1".to_string(),
                ticket_name: "Fix login".to_string(),
            },
            TicketMetadata {
                ticket_number: "PROJ-2".to_string(),
                ticket_name: "Other".to_string(),
            },
            TicketMetadata {
                ticket_number: "PROJ-3".to_string(),
                ticket_name: "Missing".to_string(),
            },
        ]);

        assert_eq!(renamed, 1);
        let after = registry.get("PROJ-1").unwrap();
        assert_eq!(after.ticket_name, "Fix login");
        assert_eq!(
            Timer {
                ticket_name: before.ticket_name.clone(),
                ..after.clone()
            },
            before
        );
        assert_eq!(registry.get("PROJ-2").unwrap().ticket_name, "Already named");
    }

    #[test]
    fn tick_only_advances_running_timers() {
        let mut registry = TimerRegistry::new();
        registry.apply_start_signal("A", None, 0);
        registry.apply_start_signal("B", None, 0);
        registry.apply_pause_signal("B", 0).unwrap();

        assert_eq!(registry.tick(1_000), 1);
        assert_eq!(registry.get("A").unwrap().total_elapsed, 1_000);
        assert_eq!(registry.get("B").unwrap().total_elapsed, 0);
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let mut registry = TimerRegistry::new();
        for ticket in ["C-3", "A-1", "B-2"] {
            registry.apply_start_signal(ticket, None, 0);
        }
        registry.apply_start_signal("A-1", None, 10);

        let order: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|t| t.ticket_number)
            .collect();
        assert_eq!(order, vec!["C-3", "A-1", "B-2"]);
    }

    #[test]
    fn relay_signal_wire_shape() {
        let signal = RelaySignal {
            kind: RelayKind::StopTask,
            ticket: "PROJ-1".to_string(),
            name: None,
        };
        assert_eq!(
            serde_json::to_value(&signal).unwrap(),
            serde_json::json!({ "type": "stop-task", "ticket": "PROJ-1" })
        );
    }
}
