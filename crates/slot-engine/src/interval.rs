//! Half-open time-of-day intervals and the overlap rule.
//!
//! Every conflict decision in this crate goes through [`Interval::overlaps`].
//! Adjacent intervals (one ends exactly when the other starts) do NOT overlap.

use serde::{Deserialize, Serialize};

use crate::clock::{TimeOfDay, MINUTES_PER_DAY};
use crate::error::{Result, SlotError};

/// `[start, end)` on a single local calendar day. Always non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalFields")]
pub struct Interval {
    pub(crate) start: TimeOfDay,
    pub(crate) end: TimeOfDay,
}

/// Unchecked wire form of an [`Interval`].
#[derive(Deserialize)]
struct IntervalFields {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TryFrom<IntervalFields> for Interval {
    type Error = SlotError;

    fn try_from(fields: IntervalFields) -> Result<Self> {
        Interval::new(fields.start, fields.end)
    }
}

impl Interval {
    /// # Errors
    /// Returns `SlotError::EmptyInterval` unless `start < end`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self> {
        if start >= end {
            return Err(SlotError::EmptyInterval {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Interval { start, end })
    }

    /// An interval of `minutes` starting at `start`.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidDuration` if `minutes` is zero or the interval
    /// would run past midnight.
    pub fn starting_at(start: TimeOfDay, minutes: u16) -> Result<Self> {
        if minutes == 0 {
            return Err(SlotError::InvalidDuration("duration must be positive".to_string()));
        }
        let end = start.checked_add(minutes).ok_or_else(|| {
            SlotError::InvalidDuration(format!(
                "{} minutes from {} runs past midnight",
                minutes, start
            ))
        })?;
        Interval::new(start, end)
    }

    /// Like [`Interval::starting_at`], but an end past midnight is clipped to
    /// 24:00 instead of rejected. Used for stored occupancies, which must still
    /// block the rest of their start day.
    pub(crate) fn starting_at_clipped(start: TimeOfDay, minutes: u16) -> Result<Self> {
        let end = start.checked_add(minutes).unwrap_or(TimeOfDay::END_OF_DAY);
        Interval::new(start, end)
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }

    /// `a.start < b.end && a.end > b.start`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Length of the shared span, or 0 when the intervals do not overlap.
    pub fn overlap_minutes(&self, other: &Interval) -> u16 {
        if !self.overlaps(other) {
            return 0;
        }
        self.end.min(other.end).minutes() - self.start.max(other.start).minutes()
    }

    /// Whether `other` lies entirely inside this interval.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Convert a decimal hour count (e.g. `1.5`) to whole minutes, rounding to the
/// nearest minute.
///
/// # Errors
/// Returns `SlotError::InvalidDuration` for non-finite, non-positive, or
/// longer-than-a-day values.
pub fn hours_to_minutes(hours: f64) -> Result<u16> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(SlotError::InvalidDuration(format!("{} hours", hours)));
    }
    let minutes = (hours * 60.0).round();
    if minutes < 1.0 || minutes > f64::from(MINUTES_PER_DAY) {
        return Err(SlotError::InvalidDuration(format!("{} hours", hours)));
    }
    Ok(minutes as u16)
}
