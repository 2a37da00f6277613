//! Fetching occupancy snapshots from the backend, with stale-result discard.
//!
//! Every change of selection (a new date, teacher, or student) triggers a
//! fresh load. Student and teacher data are fetched concurrently and joined.
//! Loads are stamped with a monotonically increasing [`Ticket`]; when a load
//! finishes after a newer one has started, its result is dropped instead of
//! overwriting the newer snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};
use crate::occupancy::{AvailabilityWindow, Demo, Occupancies, Owner, Session};

/// Inclusive range of dates a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(SlotError::InvalidDate(format!("{} is after {}", from, to)));
        }
        Ok(DateRange { from, to })
    }

    pub fn single(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }
}

/// Response shape of the student occupancy query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentSchedule {
    #[serde(default)]
    pub classes: Vec<Session>,
}

/// Response shape of the teacher occupancy query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherSchedule {
    #[serde(default)]
    pub classes: Vec<Session>,
    #[serde(default)]
    pub demos: Vec<Demo>,
}

/// Everything the resolver needs for one selection, as plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    #[serde(default)]
    pub student: StudentSchedule,
    #[serde(default)]
    pub teacher: TeacherSchedule,
    #[serde(default)]
    pub windows: Vec<AvailabilityWindow>,
}

impl OccupancySnapshot {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SlotError::Source(format!("malformed snapshot: {}", e)))
    }

    /// Validate and localize the snapshot into resolver input.
    pub fn occupancies(&self, tz: Tz, default_demo_minutes: u16) -> Result<Occupancies> {
        let mut occupancies = Occupancies::new();
        occupancies.add_sessions(Owner::Student, &self.student.classes, tz)?;
        occupancies.add_sessions(Owner::Teacher, &self.teacher.classes, tz)?;
        occupancies.add_demos(&self.teacher.demos, tz, default_demo_minutes)?;
        Ok(occupancies)
    }
}

/// The backend's read endpoints.
#[async_trait]
pub trait OccupancySource: Send + Sync {
    async fn student_classes(&self, student_id: &str, range: DateRange) -> Result<Vec<Session>>;

    async fn teacher_schedule(&self, teacher_id: &str, range: DateRange)
        -> Result<TeacherSchedule>;

    async fn teacher_windows(&self, teacher_id: &str) -> Result<Vec<AvailabilityWindow>>;
}

/// What the form currently has selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub range: DateRange,
    /// Also fetch the teacher's weekly windows (bulk scheduling).
    pub with_windows: bool,
}

/// Identifies one load. Later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Monotonic counter handing out [`Ticket`]s.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Loads snapshots from an [`OccupancySource`], discarding superseded results.
#[derive(Debug)]
pub struct SnapshotLoader<S> {
    source: S,
    generation: RequestGeneration,
}

impl<S: OccupancySource> SnapshotLoader<S> {
    pub fn new(source: S) -> Self {
        SnapshotLoader {
            source,
            generation: RequestGeneration::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the snapshot for `selection`.
    ///
    /// Returns `Ok(None)` when another load was started before this one
    /// finished; the caller should keep the newer result. This holds even if
    /// the superseded fetch failed.
    ///
    /// # Errors
    /// Propagates the first source failure of the current load. A failed load
    /// does not disturb the ticket of any newer load.
    pub async fn load(&self, selection: &Selection) -> Result<Option<OccupancySnapshot>> {
        let ticket = self.generation.issue();
        let range = selection.range;

        let student = async {
            match selection.student_id.as_deref() {
                Some(id) => self.source.student_classes(id, range).await,
                None => Ok(Vec::new()),
            }
        };
        let teacher = async {
            let Some(id) = selection.teacher_id.as_deref() else {
                return Ok((TeacherSchedule::default(), Vec::new()));
            };
            let windows = async {
                if selection.with_windows {
                    self.source.teacher_windows(id).await
                } else {
                    Ok(Vec::new())
                }
            };
            futures::try_join!(self.source.teacher_schedule(id, range), windows)
        };

        let fetched = futures::try_join!(student, teacher);

        // A superseded load is dropped whether it succeeded or failed.
        if !self.generation.is_current(ticket) {
            tracing::warn!(
                ?ticket,
                failed = fetched.is_err(),
                "discarding superseded occupancy snapshot"
            );
            return Ok(None);
        }
        let (student_classes, (teacher, windows)) = fetched?;

        tracing::debug!(
            ?ticket,
            student_classes = student_classes.len(),
            teacher_classes = teacher.classes.len(),
            demos = teacher.demos.len(),
            windows = windows.len(),
            "loaded occupancy snapshot"
        );
        Ok(Some(OccupancySnapshot {
            student: StudentSchedule {
                classes: student_classes,
            },
            teacher,
            windows,
        }))
    }
}
