//! Once-a-day run time in a configurable time zone (default UTC)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Default daily run time
pub const DEFAULT_DAILY_TIME: &str = "14:00";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid daily time '{0}': expected HH:MM")]
    Format(String),

    #[error("invalid daily time '{0}': hour must be 0-23 and minute 0-59")]
    OutOfRange(String),
}

/// Wall-clock time at which the pipeline runs each day, in `tz` (UTC unless set)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailySchedule {
    hour: u32,
    minute: u32,
    tz: Tz,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::OutOfRange(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute, tz: Tz::UTC })
    }

    /// Strict `HH:MM`, 24h
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let trimmed = raw.trim();
        let (h, m) = trimmed.split_once(':').ok_or_else(|| ScheduleError::Format(raw.to_string()))?;

        let digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(h) || !digits(m) {
            return Err(ScheduleError::Format(raw.to_string()));
        }

        let hour: u32 = h.parse().map_err(|_| ScheduleError::Format(raw.to_string()))?;
        let minute: u32 = m.parse().map_err(|_| ScheduleError::Format(raw.to_string()))?;
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::OutOfRange(raw.to_string()));
        }
        Ok(Self { hour, minute, tz: Tz::UTC })
    }

    /// Interpret the daily time in `tz`
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Calendar date of `at` in the schedule's zone
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// First scheduled instant strictly after `now`
    ///
    /// A time that falls in a DST gap runs one hour later; an ambiguous time
    /// runs at its first occurrence.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut day = self.local_date(now);
        loop {
            if let Some(at) = self.on(day).filter(|at| *at > now) {
                return at;
            }
            day += Duration::days(1);
        }
    }

    fn on(&self, day: NaiveDate) -> Option<DateTime<Utc>> {
        let local = day.and_time(self.time());
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .or_else(|| self.tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
            .map(|at| at.with_timezone(&Utc))
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self { hour: 14, minute: 0, tz: Tz::UTC }
    }
}

impl FromStr for DailySchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
