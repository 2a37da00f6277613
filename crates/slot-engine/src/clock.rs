//! Wall-clock primitives: time-of-day values, instant localization, and
//! past-time filtering.
//!
//! Nothing in this module reads the system clock. "Now" is always supplied by
//! the caller as an absolute instant plus a target timezone, so every result is
//! reproducible in tests.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// Minutes in one calendar day. `TimeOfDay` ranges over `0..=MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A local wall-clock time expressed as minutes since midnight.
///
/// `24:00` (1440) is a valid value so that an interval can end exactly at
/// midnight; it is never a valid session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(pub(crate) u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    /// Build from minutes since midnight.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidTime` if `minutes` exceeds 24:00.
    pub fn from_minutes(minutes: u16) -> Result<Self> {
        if minutes > MINUTES_PER_DAY {
            return Err(SlotError::InvalidTime(format!(
                "{} minutes is past the end of the day",
                minutes
            )));
        }
        Ok(TimeOfDay(minutes))
    }

    /// Build from an hour/minute pair.
    pub fn hm(hour: u16, minute: u16) -> Result<Self> {
        if minute >= 60 {
            return Err(SlotError::InvalidTime(format!("{:02}:{:02}", hour, minute)));
        }
        let minutes = hour
            .checked_mul(60)
            .and_then(|m| m.checked_add(minute))
            .ok_or_else(|| SlotError::InvalidTime(format!("{:02}:{:02}", hour, minute)))?;
        Self::from_minutes(minutes)
    }

    /// Parse `HH:MM` or `HH:MM:SS`. Seconds are accepted but truncated.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidTime` for anything that is not a well-formed
    /// 24-hour clock value.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || SlotError::InvalidTime(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid());
        }
        let mut fields = [0u16; 3];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            fields[i] = part.parse().map_err(|_| invalid())?;
        }
        let [hour, minute, second] = fields;
        if minute >= 60 || second >= 60 {
            return Err(invalid());
        }
        // 24:00 is the end-of-day boundary; 24:15 is not a time.
        if hour > 24 || (hour == 24 && (minute > 0 || second > 0)) {
            return Err(invalid());
        }
        Ok(TimeOfDay(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Add minutes, returning `None` if the result would pass 24:00.
    pub fn checked_add(self, minutes: u16) -> Option<Self> {
        let total = self.0.checked_add(minutes)?;
        (total <= MINUTES_PER_DAY).then_some(TimeOfDay(total))
    }

    fn from_naive_time(t: chrono::NaiveTime) -> Self {
        TimeOfDay((t.hour() * 60 + t.minute()) as u16)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = SlotError;

    fn try_from(value: String) -> Result<Self> {
        TimeOfDay::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl std::str::FromStr for TimeOfDay {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self> {
        TimeOfDay::parse(s)
    }
}

/// Parse an IANA timezone identifier.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| SlotError::InvalidTimezone(name.to_string()))
}

/// Parse an absolute instant.
///
/// Accepts RFC 3339 (`2026-03-16T08:30:00+00:00`, `...Z`), the space-separated
/// form Postgres emits (`2026-03-16 08:30:00+00`), and naive datetimes, which
/// are interpreted as UTC.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%#z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(ndt.and_utc());
        }
    }
    Err(SlotError::InvalidTimestamp(s.to_string()))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| SlotError::InvalidDate(s.to_string()))
}

/// Map a Sunday-based day index (0 = Sunday … 6 = Saturday) to a weekday.
pub fn weekday_from_index(index: u8) -> Result<Weekday> {
    match index {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        other => Err(SlotError::InvalidWeekday(other.to_string())),
    }
}

/// Parse a weekday name (`mon`, `Monday`, …) or a Sunday-based index (`0`-`6`).
pub fn parse_weekday(s: &str) -> Result<Weekday> {
    let trimmed = s.trim();
    if let Ok(index) = trimmed.parse::<u8>() {
        return weekday_from_index(index);
    }
    trimmed
        .parse()
        .map_err(|_| SlotError::InvalidWeekday(s.to_string()))
}

/// Convert an absolute instant to the local calendar date and time of day in `tz`.
pub fn localize(instant: DateTime<Utc>, tz: Tz) -> (NaiveDate, TimeOfDay) {
    let local = instant.with_timezone(&tz).naive_local();
    (local.date(), TimeOfDay::from_naive_time(local.time()))
}

/// Resolve a session's `started_at` field to a local time of day.
///
/// Plain clock strings and naive datetimes are already wall-clock values and
/// are taken as-is. A timestamp carrying an offset is converted into `tz`.
pub fn resolve_start(raw: &str, tz: Tz) -> Result<TimeOfDay> {
    let trimmed = raw.trim();
    if let Ok(t) = TimeOfDay::parse(trimmed) {
        return Ok(t);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(localize(dt.with_timezone(&Utc), tz).1);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(TimeOfDay::from_naive_time(ndt.time()));
        }
    }
    Err(SlotError::InvalidTime(raw.to_string()))
}

/// The caller's "now", localized to the scheduling timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalNow {
    pub date: NaiveDate,
    pub time: TimeOfDay,
}

impl LocalNow {
    pub fn from_instant(instant: DateTime<Utc>, tz: Tz) -> Self {
        let (date, time) = localize(instant, tz);
        LocalNow { date, time }
    }

    /// A start is in the past if its date is before today, or it is today and
    /// the start is at or before the current minute.
    pub fn is_past(&self, date: NaiveDate, start: TimeOfDay) -> bool {
        date < self.date || (date == self.date && start <= self.time)
    }
}

/// Drop starts on `date` that are already in the past relative to `now`.
pub fn filter_past(starts: &[TimeOfDay], date: NaiveDate, now: &LocalNow) -> Vec<TimeOfDay> {
    starts
        .iter()
        .copied()
        .filter(|&s| !now.is_past(date, s))
        .collect()
}
