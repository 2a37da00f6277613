//! Free windows within business hours for one date.
//!
//! Collects every occupancy on the date (student and teacher alike), clips it
//! to business hours, merges overlapping or touching busy periods, then reports
//! the gaps between them.

use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::TimeOfDay;
use crate::grid::SlotGrid;
use crate::interval::Interval;
use crate::occupancy::Occupancies;

/// A free stretch of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub duration_minutes: u16,
}

impl FreeWindow {
    fn between(start: TimeOfDay, end: TimeOfDay) -> Self {
        FreeWindow {
            start,
            end,
            duration_minutes: end.minutes() - start.minutes(),
        }
    }
}

/// Merge the date's busy periods, clipped to business hours.
///
/// Returns a sorted, non-overlapping list.
pub fn merge_busy_periods(
    occupancies: &Occupancies,
    date: NaiveDate,
    grid: &SlotGrid,
) -> Vec<Interval> {
    let hours = grid.hours();
    let mut intervals: Vec<Interval> = occupancies
        .entries()
        .iter()
        .filter(|e| e.date == date && e.interval.overlaps(&hours))
        .map(|e| Interval {
            start: e.interval.start.max(hours.start),
            end: e.interval.end.min(hours.end),
        })
        .collect();

    intervals.sort();

    let mut merged: Vec<Interval> = Vec::new();
    for interval in intervals {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }
    merged
}

/// Gaps between busy periods on `date` within business hours.
pub fn free_windows(
    occupancies: &Occupancies,
    date: NaiveDate,
    grid: &SlotGrid,
) -> Vec<FreeWindow> {
    let hours = grid.hours();
    let mut free = Vec::new();
    let mut cursor = hours.start;

    for busy in merge_busy_periods(occupancies, date, grid) {
        if cursor < busy.start {
            free.push(FreeWindow::between(cursor, busy.start));
        }
        cursor = cursor.max(busy.end);
    }

    if cursor < hours.end {
        free.push(FreeWindow::between(cursor, hours.end));
    }
    free
}

/// The first free window on `date` lasting at least `min_minutes`.
pub fn first_free_window(
    occupancies: &Occupancies,
    date: NaiveDate,
    grid: &SlotGrid,
    min_minutes: u16,
) -> Option<FreeWindow> {
    free_windows(occupancies, date, grid)
        .into_iter()
        .find(|w| w.duration_minutes >= min_minutes)
}
