//! Countdown engine
//!
//! Holds at most one session. Remaining time is always derived from the
//! wall-clock end instant, so a session survives the host sleeping: after
//! resume the next tick sees the true remaining time instead of a count of
//! ticks. Every operation takes `now` from the caller and none of them block.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::input::WallClockTime;
use crate::error::TimerError;

/// Remaining seconds at which the first warning fires
pub const FIVE_MINUTE_MARK_SECS: i64 = 300;
/// Remaining seconds at which the second warning fires
pub const ONE_MINUTE_MARK_SECS: i64 = 60;

/// Something a tick observed. Turning it into a notification or a screen
/// lock is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerEvent {
    FiveMinuteWarning,
    OneMinuteWarning,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    Running,
}

/// The running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    target_end: DateTime<Utc>,
    total_duration_seconds: i64,
    notified_five_minute_mark: bool,
    notified_one_minute_mark: bool,
}

impl TimerSession {
    fn new(now: DateTime<Utc>, duration_seconds: i64) -> Result<Self, TimerError> {
        let target_end = TimeDelta::try_seconds(duration_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or(TimerError::InvalidDuration)?;
        Ok(Self {
            target_end,
            total_duration_seconds: duration_seconds,
            notified_five_minute_mark: false,
            notified_one_minute_mark: false,
        })
    }

    pub fn target_end(&self) -> DateTime<Utc> {
        self.target_end
    }

    pub fn total_duration_seconds(&self) -> i64 {
        self.total_duration_seconds
    }

    pub fn notified_five_minute_mark(&self) -> bool {
        self.notified_five_minute_mark
    }

    pub fn notified_one_minute_mark(&self) -> bool {
        self.notified_one_minute_mark
    }

    fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.target_end - now).max(TimeDelta::zero())
    }
}

/// True when `remaining` lies in the half-open window `(mark - 1s, mark]`
fn in_warning_window(remaining: TimeDelta, mark_secs: i64) -> bool {
    remaining <= TimeDelta::seconds(mark_secs) && remaining > TimeDelta::seconds(mark_secs - 1)
}

#[derive(Debug, Default)]
pub struct TimerEngine {
    session: Option<TimerSession>,
}

impl TimerEngine {
    /// Create an idle engine
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn status(&self) -> TimerStatus {
        if self.session.is_some() {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    /// Start a session of `duration_seconds`, replacing any running one.
    /// A rejected start leaves the engine as it was.
    pub fn start(&mut self, duration_seconds: i64, now: DateTime<Utc>) -> Result<(), TimerError> {
        if duration_seconds <= 0 {
            return Err(TimerError::InvalidDuration);
        }
        let session = TimerSession::new(now, duration_seconds)?;

        if let Some(previous) = self.session.replace(session) {
            debug!(
                "Replaced running session ({}s left)",
                previous.remaining(now).num_seconds()
            );
        }
        info!("Timer started for {}s", duration_seconds);
        Ok(())
    }

    /// Start a session ending at `target` on the same calendar day as `now`.
    /// Returns the resolved duration in seconds.
    pub fn start_at<Tz: TimeZone>(
        &mut self,
        target: WallClockTime,
        now: DateTime<Tz>,
    ) -> Result<i64, TimerError> {
        let duration_seconds = target.seconds_from(&now)?;
        if duration_seconds <= 0 {
            debug!("End time {} is not after now", target);
            return Err(TimerError::TimeInPast);
        }
        self.start(duration_seconds, now.with_timezone(&Utc))?;
        info!("Timer set to end at {}", target);
        Ok(duration_seconds)
    }

    /// Cancel the running session without a completion event.
    /// Returns whether there was anything to cancel.
    pub fn stop(&mut self) -> bool {
        let cancelled = self.session.take().is_some();
        if cancelled {
            info!("Timer stopped");
        }
        cancelled
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        self.session
            .as_ref()
            .map_or(TimeDelta::zero(), |s| s.remaining(now))
    }

    /// Whole seconds left, 0 when idle
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.remaining(now).num_seconds()
    }

    /// Advance the session to `now` and report what happened, in order.
    ///
    /// Each warning fires at most once per session, and only if a tick lands
    /// inside its one-second window; a tick that skips the window (e.g. across
    /// a suspend) misses that warning. `Completed` fires once less than a
    /// whole second is left, and ends the session.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerEvent> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let remaining = session.remaining(now);
        let mut events = Vec::new();

        if !session.notified_five_minute_mark && in_warning_window(remaining, FIVE_MINUTE_MARK_SECS) {
            session.notified_five_minute_mark = true;
            events.push(TimerEvent::FiveMinuteWarning);
        }

        if !session.notified_one_minute_mark && in_warning_window(remaining, ONE_MINUTE_MARK_SECS) {
            session.notified_one_minute_mark = true;
            events.push(TimerEvent::OneMinuteWarning);
        }

        // Same whole-second rounding as `remaining_seconds`
        if remaining.num_seconds() == 0 {
            info!("Timer completed after {}s", session.total_duration_seconds);
            self.session = None;
            events.push(TimerEvent::Completed);
        }

        if !events.is_empty() {
            debug!("Tick produced {:?}", events);
        }
        events
    }
}
