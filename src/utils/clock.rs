//! Wall-clock helpers

use chrono::Utc;

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
