//! Session log: the append-only interval history of a single timer

use serde::{Deserialize, Serialize};

/// How a session is progressing, or how it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Paused,
    Hold,
    Completed,
    Stopped,
    /// An external start signal cut the interval short
    #[serde(rename = "restarted_by_ipc")]
    RestartedBySignal,
}

/// One contiguous interval of tracked time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Milliseconds since the Unix epoch
    pub start_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Accumulated milliseconds, frozen once `end_time` is set
    pub duration: u64,
    pub status: SessionStatus,
}

impl Session {
    fn open(now: i64) -> Self {
        Self {
            start_time: now,
            end_time: None,
            duration: 0,
            status: SessionStatus::Running,
        }
    }

    /// Check whether the session is still open
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Ordered session history. Only the trailing open session is ever mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLog {
    sessions: Vec<Session>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fresh running session starting at `now`.
    ///
    /// Callers close any open session first; the log refuses to hold two.
    pub fn open_session(&mut self, now: i64) {
        if self.open().is_some() {
            tracing::warn!("Refusing to open a second session while one is open");
            return;
        }
        self.sessions.push(Session::open(now));
    }

    /// Close the open session, if any. Returns whether one was closed.
    pub fn close_open_session(&mut self, now: i64, duration: u64, status: SessionStatus) -> bool {
        match self.open_mut() {
            Some(session) => {
                session.end_time = Some(now);
                session.duration = duration;
                session.status = status;
                true
            }
            None => false,
        }
    }

    /// Add `ms` to the open session's running duration
    pub fn advance_open(&mut self, ms: u64) {
        if let Some(session) = self.open_mut() {
            session.duration = session.duration.saturating_add(ms);
        }
    }

    pub fn open(&self) -> Option<&Session> {
        self.sessions.last().filter(|s| s.is_open())
    }

    // The open session can only be the last one: opening requires none open.
    fn open_mut(&mut self) -> Option<&mut Session> {
        self.sessions.last_mut().filter(|s| s.is_open())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn as_slice(&self) -> &[Session] {
        &self.sessions
    }

    /// Sum of every session's duration, open one included
    pub fn total_duration(&self) -> u64 {
        self.sessions.iter().map(|s| s.duration).sum()
    }

    /// Number of sessions without an end time
    pub fn open_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_open()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_then_close_stamps_end_time() {
        let mut log = SessionLog::new();
        log.open_session(1_000);
        assert_eq!(log.open().map(|s| s.start_time), Some(1_000));

        assert!(log.close_open_session(4_000, 3_000, SessionStatus::Paused));
        let closed = &log.as_slice()[0];
        assert_eq!(closed.end_time, Some(4_000));
        assert_eq!(closed.duration, 3_000);
        assert_eq!(closed.status, SessionStatus::Paused);
        assert!(log.open().is_none());
    }

    #[test]
    fn close_without_open_session_is_noop() {
        let mut log = SessionLog::new();
        assert!(!log.close_open_session(10, 0, SessionStatus::Stopped));
        assert!(log.is_empty());
    }

    #[test]
    fn second_open_is_refused() {
        let mut log = SessionLog::new();
        log.open_session(0);
        log.open_session(500);
        assert_eq!(log.len(), 1);
        assert_eq!(log.open_count(), 1);
    }

    #[test]
    fn advance_touches_only_open_session() {
        let mut log = SessionLog::new();
        log.open_session(0);
        log.advance_open(2_000);
        log.close_open_session(2_000, 2_000, SessionStatus::Hold);
        let closed = log.as_slice()[0].clone();

        log.advance_open(1_000);
        assert_eq!(log.as_slice()[0], closed);

        log.open_session(3_000);
        log.advance_open(1_000);
        assert_eq!(log.as_slice()[0], closed);
        assert_eq!(log.total_duration(), 3_000);
    }

    #[test]
    fn serializes_with_camel_case_and_snake_status() {
        let mut log = SessionLog::new();
        log.open_session(7);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "startTime": 7, "duration": 0, "status": "running" }])
        );
    }

    #[test]
    fn restarted_marker_uses_ipc_tag() {
        let json = serde_json::to_value(SessionStatus::RestartedBySignal).unwrap();
        assert_eq!(json, serde_json::json!("restarted_by_ipc"));

        let parsed: SessionStatus = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, SessionStatus::RestartedBySignal);
    }
}
