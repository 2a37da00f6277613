//! Bulk (recurring) scheduling: which grid slots are free on every target date.
//!
//! A recurring request picks a date range and a set of weekdays. A start time
//! is offered only if its micro-slot is free on *all* resulting dates, and an
//! end time only if the whole `[start, end)` span is. The end scan never skips
//! over a blocked boundary.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::clock::{LocalNow, TimeOfDay};
use crate::error::Result;
use crate::grid::SlotGrid;
use crate::interval::Interval;
use crate::occupancy::{AvailabilityWindow, Occupancies};

/// Shortest duration a bulk schedule may be given.
pub const MIN_DURATION_MINUTES: u16 = 60;

/// Every date in `[from, to]` whose weekday is in `weekdays`.
///
/// Dates are plain calendar dates, so the weekday is the date's own weekday
/// with no timezone shift. Returns an empty list when `from > to`.
pub fn target_dates(from: NaiveDate, to: NaiveDate, weekdays: &[Weekday]) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| weekdays.contains(&d.weekday()))
        .collect()
}

/// Enumerates conflict-free starts and ends across a set of target dates.
#[derive(Debug, Clone)]
pub struct BulkPlanner<'a> {
    occupancies: &'a Occupancies,
    dates: Vec<NaiveDate>,
    grid: SlotGrid,
    min_duration: u16,
    exclude_id: Option<String>,
    windows: Vec<(Weekday, Interval)>,
}

impl<'a> BulkPlanner<'a> {
    pub fn new(occupancies: &'a Occupancies, dates: Vec<NaiveDate>, grid: SlotGrid) -> Self {
        BulkPlanner {
            occupancies,
            dates,
            grid,
            min_duration: MIN_DURATION_MINUTES,
            exclude_id: None,
            windows: Vec::new(),
        }
    }

    pub fn with_min_duration(mut self, minutes: u16) -> Self {
        self.min_duration = minutes;
        self
    }

    /// Ignore the occupancy with this id (a series being edited).
    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }

    /// Additionally require every slot to sit inside one of the teacher's
    /// weekly windows on each target date's weekday.
    ///
    /// Touching or overlapping windows on the same weekday are merged, so a
    /// session may span 09:00-12:00 and 12:00-15:00.
    ///
    /// # Errors
    /// Returns an error for a window with an out-of-range weekday or an empty
    /// time span.
    pub fn with_windows(mut self, windows: &[AvailabilityWindow]) -> Result<Self> {
        let mut parsed = Vec::with_capacity(windows.len());
        for window in windows {
            parsed.push((window.weekday()?, window.interval()?));
        }
        parsed.sort_by_key(|(day, interval)| (day.num_days_from_sunday(), *interval));

        let mut merged: Vec<(Weekday, Interval)> = Vec::new();
        for (day, interval) in parsed {
            if let Some((last_day, last)) = merged.last_mut() {
                if *last_day == day && interval.start <= last.end {
                    last.end = last.end.max(interval.end);
                    continue;
                }
            }
            merged.push((day, interval));
        }
        self.windows = merged;
        Ok(self)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    /// Whether `interval` is free on every target date. Never true for an
    /// empty date set.
    pub fn is_free(&self, interval: &Interval) -> bool {
        !self.dates.is_empty()
            && self.dates.iter().all(|&date| {
                self.within_windows(date, interval)
                    && !self
                        .occupancies
                        .blocks(date, interval, self.exclude_id.as_deref())
            })
    }

    fn within_windows(&self, date: NaiveDate, interval: &Interval) -> bool {
        if self.windows.is_empty() {
            return true;
        }
        let weekday = date.weekday();
        self.windows
            .iter()
            .any(|(day, window)| *day == weekday && window.contains(interval))
    }

    /// Grid starts whose micro-slot is free on every target date.
    pub fn valid_starts(&self) -> Vec<TimeOfDay> {
        if self.dates.is_empty() {
            return Vec::new();
        }
        let starts: Vec<TimeOfDay> = self
            .grid
            .starts()
            .filter(|&start| self.is_free(&self.grid.micro_slot(start)))
            .collect();
        tracing::debug!(
            dates = self.dates.len(),
            valid = starts.len(),
            "enumerated bulk starts"
        );
        starts
    }

    /// [`BulkPlanner::valid_starts`] restricted to what can still be booked.
    ///
    /// Target dates before today are skipped: they neither contribute starts
    /// nor block them. On today, starts at or before now are dropped. When
    /// every target date is past the result is empty.
    pub fn valid_starts_after(&self, now: &LocalNow) -> Vec<TimeOfDay> {
        let upcoming = BulkPlanner {
            dates: self.dates.iter().copied().filter(|&d| d >= now.date).collect(),
            ..self.clone()
        };
        if upcoming.dates.len() < self.dates.len() {
            tracing::debug!(
                skipped = self.dates.len() - upcoming.dates.len(),
                "skipping past target dates"
            );
        }
        upcoming
            .valid_starts()
            .into_iter()
            .filter(|&start| upcoming.dates.iter().all(|&date| !now.is_past(date, start)))
            .collect()
    }

    /// End times reachable from `start` without crossing a blocked boundary,
    /// keeping only those at least the minimum duration away.
    ///
    /// Returns an empty list for an empty date set or for a start that is not
    /// on the grid.
    pub fn valid_ends(&self, start: TimeOfDay) -> Vec<TimeOfDay> {
        if self.dates.is_empty() || !self.grid.is_start(start) {
            return Vec::new();
        }
        let mut ends = Vec::new();
        for end in self.grid.boundaries_after(start) {
            let span = Interval { start, end };
            if !self.is_free(&span) {
                break;
            }
            if span.duration_minutes() >= self.min_duration {
                ends.push(end);
            }
        }
        ends
    }

    /// Earliest end that satisfies the minimum duration, if any.
    pub fn suggest_end(&self, start: TimeOfDay) -> Option<TimeOfDay> {
        self.valid_ends(start).into_iter().next()
    }
}
