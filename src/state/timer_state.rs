//! Timer snapshot for display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timer_engine::{TimerEngine, TimerStatus};

const TOMATO: &str = "🍅";
const IDLE_STATUS_LINE: &str = "Ready to start";

/// What the presentation layer shows for the timer at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub remaining_seconds: i64,
    pub total_duration_seconds: Option<i64>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Menu bar title, e.g. "🍅 24:59"
    pub label: String,
    /// Status line, e.g. "Time remaining: 24:59"
    pub status_line: String,
    pub can_start: bool,
    pub can_stop: bool,
}

impl TimerSnapshot {
    /// Capture the engine as of `now`
    pub fn capture(engine: &TimerEngine, now: DateTime<Utc>) -> Self {
        match engine.session() {
            Some(session) => {
                let remaining = engine.remaining_seconds(now);
                let clock = format_clock(remaining);
                Self {
                    status: TimerStatus::Running,
                    remaining_seconds: remaining,
                    total_duration_seconds: Some(session.total_duration_seconds()),
                    ends_at: Some(session.target_end()),
                    label: format!("{} {}", TOMATO, clock),
                    status_line: format!("Time remaining: {}", clock),
                    can_start: false,
                    can_stop: true,
                }
            }
            None => Self::idle(),
        }
    }

    /// Snapshot of an engine with no session
    pub fn idle() -> Self {
        Self {
            status: TimerStatus::Idle,
            remaining_seconds: 0,
            total_duration_seconds: None,
            ends_at: None,
            label: TOMATO.to_string(),
            status_line: IDLE_STATUS_LINE.to_string(),
            can_start: true,
            can_stop: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// Format seconds as `M:SS`
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
