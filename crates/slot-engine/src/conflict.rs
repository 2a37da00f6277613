//! Single-slot double-booking check.
//!
//! A candidate slot conflicts with an occupancy on the same local date when
//! their intervals overlap. Student occupancies are consulted before teacher
//! occupancies and the first hit decides the answer, so a slot that collides
//! with both is reported as [`Conflict::Student`]. Use [`find_conflicts`] to
//! see every collision.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::clock::TimeOfDay;
use crate::error::Result;
use crate::interval::{hours_to_minutes, Interval};
use crate::occupancy::{BusyEntry, Occupancies, Owner};

/// A proposed slot for a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCandidate {
    pub date: NaiveDate,
    pub interval: Interval,
}

impl SlotCandidate {
    /// # Errors
    /// Returns `SlotError::InvalidDuration` for a non-positive duration or one
    /// that runs past midnight.
    pub fn new(date: NaiveDate, start: TimeOfDay, duration_hours: f64) -> Result<Self> {
        let minutes = hours_to_minutes(duration_hours)?;
        Ok(SlotCandidate {
            date,
            interval: Interval::starting_at(start, minutes)?,
        })
    }

    pub fn from_interval(date: NaiveDate, interval: Interval) -> Self {
        SlotCandidate { date, interval }
    }
}

/// Outcome of a single-slot check.
///
/// Serializes as `false`, `"student"`, or `"teacher"`, which is the shape the
/// scheduling forms switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conflict {
    #[default]
    None,
    Student,
    Teacher,
}

impl Conflict {
    pub fn is_conflict(self) -> bool {
        self != Conflict::None
    }
}

impl From<Owner> for Conflict {
    fn from(owner: Owner) -> Self {
        match owner {
            Owner::Student => Conflict::Student,
            Owner::Teacher => Conflict::Teacher,
        }
    }
}

impl Serialize for Conflict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Conflict::None => serializer.serialize_bool(false),
            Conflict::Student => serializer.serialize_str("student"),
            Conflict::Teacher => serializer.serialize_str("teacher"),
        }
    }
}

/// An occupancy that overlaps the candidate, with the size of the overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictDetail {
    pub entry: BusyEntry,
    pub overlap_minutes: u16,
}

const CHECK_ORDER: [Owner; 2] = [Owner::Student, Owner::Teacher];

/// Check one candidate against a snapshot.
///
/// Occupancies whose id equals `exclude_id` are ignored, so a session being
/// rescheduled never conflicts with itself.
pub fn check_slot(
    occupancies: &Occupancies,
    candidate: &SlotCandidate,
    exclude_id: Option<&str>,
) -> Conflict {
    let conflict = CHECK_ORDER
        .iter()
        .find(|&&owner| {
            occupancies
                .overlapping(owner, candidate.date, &candidate.interval, exclude_id)
                .next()
                .is_some()
        })
        .map_or(Conflict::None, |&owner| Conflict::from(owner));

    tracing::debug!(
        date = %candidate.date,
        start = %candidate.interval.start,
        end = %candidate.interval.end,
        ?conflict,
        "checked slot"
    );
    conflict
}

/// Every occupancy overlapping the candidate: student entries first, then
/// teacher entries, each group in snapshot order.
pub fn find_conflicts(
    occupancies: &Occupancies,
    candidate: &SlotCandidate,
    exclude_id: Option<&str>,
) -> Vec<ConflictDetail> {
    let date = candidate.date;
    let interval = &candidate.interval;
    CHECK_ORDER
        .iter()
        .flat_map(move |&owner| occupancies.overlapping(owner, date, interval, exclude_id))
        .map(|entry| ConflictDetail {
            overlap_minutes: entry.interval.overlap_minutes(&candidate.interval),
            entry: entry.clone(),
        })
        .collect()
}
