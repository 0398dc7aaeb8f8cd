//! User input for starting a session: a duration in minutes or an end time

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::TimerError;

/// Offset used to prefill the end-time field when switching input modes
pub const SUGGESTED_SESSION_MINUTES: i64 = 25;

/// The two ways a user can ask for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum StartInput {
    /// Positive whole number of minutes, as typed
    Duration(String),
    /// 24-hour `HH:MM`, as typed
    EndTime(String),
}

/// Parse a minutes field into a session length in seconds
pub fn parse_minutes(text: &str) -> Result<i64, TimerError> {
    let minutes: i64 = text
        .trim()
        .parse()
        .map_err(|_| TimerError::InvalidDuration)?;
    if minutes <= 0 {
        return Err(TimerError::InvalidDuration);
    }
    minutes.checked_mul(60).ok_or(TimerError::InvalidDuration)
}

/// An hour and minute on a 24-hour clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClockTime {
    hour: u32,
    minute: u32,
}

impl WallClockTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimerError> {
        if hour >= 24 || minute >= 60 {
            return Err(TimerError::InvalidTime);
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// The instant this time falls on, on the same calendar day as `now`
    pub fn on_day_of<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<DateTime<Tz>, TimerError> {
        let naive = now
            .date_naive()
            .and_hms_opt(self.hour, self.minute, 0)
            .ok_or(TimerError::InvalidTime)?;
        // Local times skipped by a DST change have no instant.
        now.timezone()
            .from_local_datetime(&naive)
            .earliest()
            .ok_or(TimerError::InvalidTime)
    }

    /// Whole seconds from `now` until this time today, truncated toward zero.
    /// Negative when the time has already passed.
    pub fn seconds_from<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<i64, TimerError> {
        let target = self.on_day_of(now)?;
        Ok((target - now.clone()).num_seconds())
    }

    /// The end time offered when the user switches to end-time mode
    pub fn suggested_end<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let later = now.clone() + TimeDelta::minutes(SUGGESTED_SESSION_MINUTES);
        Self {
            hour: later.hour(),
            minute: later.minute(),
        }
    }
}

impl FromStr for WallClockTime {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s.trim().split_once(':').ok_or(TimerError::InvalidTime)?;
        Self::new(parse_clock_field(h)?, parse_clock_field(m)?)
    }
}

fn parse_clock_field(field: &str) -> Result<u32, TimerError> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimerError::InvalidTime);
    }
    field.parse().map_err(|_| TimerError::InvalidTime)
}

impl fmt::Display for WallClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
