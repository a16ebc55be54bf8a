//! Per-ticket timer state and its transitions

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{SessionLog, SessionStatus, TransitionError};

/// Lifecycle status of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Running,
    Paused,
    Hold,
    Completed,
    Stopped,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Hold => "hold",
            TimerStatus::Completed => "completed",
            TimerStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Live tracking state for one ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub ticket_number: String,
    pub ticket_name: String,
    pub is_running: bool,
    pub status: TimerStatus,
    /// Milliseconds in the current segment since the last start/resume
    pub elapsed_time: u64,
    /// Milliseconds across the whole lifetime, never reset
    pub total_elapsed: u64,
    pub sessions: SessionLog,
}

impl Timer {
    /// Create a stopped timer with an empty session log
    pub fn new(ticket_number: impl Into<String>, ticket_name: impl Into<String>) -> Self {
        Self {
            ticket_number: ticket_number.into(),
            ticket_name: ticket_name.into(),
            is_running: false,
            status: TimerStatus::Stopped,
            elapsed_time: 0,
            total_elapsed: 0,
            sessions: SessionLog::new(),
        }
    }

    /// True until the first session is opened
    pub fn is_fresh(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Check whether the name is still the bare ticket number
    pub fn has_placeholder_name(&self) -> bool {
        self.ticket_name == self.ticket_number
    }

    fn reject(&self, op: &'static str) -> TransitionError {
        TransitionError::InvalidTransition {
            op,
            status: self.status,
        }
    }

    /// Duration to freeze into the open session when it closes.
    ///
    /// A running segment is measured by `elapsed_time`; anything else keeps
    /// whatever the session already accumulated.
    fn closing_duration(&self) -> u64 {
        if self.is_running {
            self.elapsed_time
        } else {
            self.sessions.open().map(|s| s.duration).unwrap_or(0)
        }
    }

    fn close_open(&mut self, now: i64, status: SessionStatus) {
        let duration = self.closing_duration();
        self.sessions.close_open_session(now, duration, status);
    }

    fn open_running(&mut self, now: i64) {
        self.sessions.open_session(now);
        self.elapsed_time = 0;
        self.is_running = true;
        self.status = TimerStatus::Running;
    }

    fn settle(&mut self, status: TimerStatus) {
        self.is_running = false;
        self.status = status;
    }

    /// Start a fresh, paused or held timer
    pub fn start(&mut self, now: i64) -> Result<(), TransitionError> {
        let allowed = self.is_fresh()
            || matches!(self.status, TimerStatus::Paused | TimerStatus::Hold);
        if !allowed || self.is_running {
            return Err(self.reject("start"));
        }
        self.close_open(now, SessionStatus::Paused);
        self.open_running(now);
        Ok(())
    }

    pub fn pause(&mut self, now: i64) -> Result<(), TransitionError> {
        if !self.is_running {
            return Err(self.reject("pause"));
        }
        self.close_open(now, SessionStatus::Paused);
        self.settle(TimerStatus::Paused);
        Ok(())
    }

    pub fn resume(&mut self, now: i64) -> Result<(), TransitionError> {
        if self.is_running {
            return Err(self.reject("resume"));
        }
        self.close_open(now, SessionStatus::Paused);
        self.open_running(now);
        Ok(())
    }

    pub fn hold(&mut self, now: i64) -> Result<(), TransitionError> {
        if !self.is_running {
            return Err(self.reject("hold"));
        }
        self.close_open(now, SessionStatus::Hold);
        self.settle(TimerStatus::Hold);
        Ok(())
    }

    pub fn complete(&mut self, now: i64) -> Result<(), TransitionError> {
        if self.status == TimerStatus::Completed {
            return Err(self.reject("complete"));
        }
        self.close_open(now, SessionStatus::Completed);
        self.settle(TimerStatus::Completed);
        Ok(())
    }

    pub fn stop(&mut self, now: i64) -> Result<(), TransitionError> {
        if self.status == TimerStatus::Stopped && self.sessions.open().is_none() {
            return Err(self.reject("stop"));
        }
        self.close_open(now, SessionStatus::Stopped);
        self.settle(TimerStatus::Stopped);
        Ok(())
    }

    /// Unconditionally begin a new running segment, whatever the state
    pub fn restart(&mut self, now: i64) {
        self.close_open(now, SessionStatus::RestartedBySignal);
        self.open_running(now);
    }

    /// Advance a running timer by `step_ms`. Returns whether time was added.
    pub fn tick(&mut self, step_ms: u64) -> bool {
        if !(self.is_running && self.status == TimerStatus::Running) {
            return false;
        }
        self.elapsed_time = self.elapsed_time.saturating_add(step_ms);
        self.total_elapsed = self.total_elapsed.saturating_add(step_ms);
        self.sessions.advance_open(step_ms);
        true
    }
}
