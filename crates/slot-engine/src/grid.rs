//! The quarter-hour grid that slot pickers enumerate over.

use crate::clock::TimeOfDay;
use crate::error::{Result, SlotError};
use crate::interval::Interval;

pub const DEFAULT_STEP_MINUTES: u16 = 15;

/// Fixed-step grid of start times inside business hours.
///
/// With the defaults the starts run 06:00, 06:15, …, 21:45 and the last
/// micro-slot ends at 22:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    step: u16,
    opens: TimeOfDay,
    closes: TimeOfDay,
}

impl Default for SlotGrid {
    fn default() -> Self {
        SlotGrid {
            step: DEFAULT_STEP_MINUTES,
            opens: TimeOfDay(6 * 60),
            closes: TimeOfDay(22 * 60),
        }
    }
}

impl SlotGrid {
    /// # Errors
    /// Returns `SlotError::Config` if the step is zero, business hours are
    /// empty, or the step does not evenly divide business hours.
    pub fn new(step: u16, opens: TimeOfDay, closes: TimeOfDay) -> Result<Self> {
        if step == 0 {
            return Err(SlotError::Config("grid step must be positive".to_string()));
        }
        if opens >= closes {
            return Err(SlotError::Config(format!(
                "business hours {}-{} are empty",
                opens, closes
            )));
        }
        let span = closes.minutes() - opens.minutes();
        if span % step != 0 {
            return Err(SlotError::Config(format!(
                "{}-minute step does not divide {}-{}",
                step, opens, closes
            )));
        }
        Ok(SlotGrid { step, opens, closes })
    }

    pub fn step(&self) -> u16 {
        self.step
    }

    pub fn opens(&self) -> TimeOfDay {
        self.opens
    }

    pub fn closes(&self) -> TimeOfDay {
        self.closes
    }

    /// Business hours as an interval.
    pub fn hours(&self) -> Interval {
        Interval {
            start: self.opens,
            end: self.closes,
        }
    }

    /// Every start time on the grid, in order. The closing time is excluded.
    pub fn starts(&self) -> impl Iterator<Item = TimeOfDay> + '_ {
        (self.opens.minutes()..self.closes.minutes())
            .step_by(usize::from(self.step))
            .map(TimeOfDay)
    }

    /// Grid boundaries strictly after `start`, up to and including closing time.
    pub fn boundaries_after(&self, start: TimeOfDay) -> impl Iterator<Item = TimeOfDay> + '_ {
        let first = start.minutes() + self.step;
        (first..=self.closes.minutes())
            .step_by(usize::from(self.step))
            .map(TimeOfDay)
    }

    /// Whether `t` is one of [`SlotGrid::starts`].
    pub fn is_start(&self, t: TimeOfDay) -> bool {
        t >= self.opens && t < self.closes && (t.minutes() - self.opens.minutes()) % self.step == 0
    }

    /// The single-step micro-slot beginning at `start`.
    pub(crate) fn micro_slot(&self, start: TimeOfDay) -> Interval {
        Interval {
            start,
            end: TimeOfDay(start.minutes() + self.step),
        }
    }
}
