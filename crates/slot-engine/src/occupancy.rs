//! Occupancy records as the backend returns them, and their normalized form.
//!
//! Raw [`Session`] and [`Demo`] records carry loosely-typed time fields
//! (clock strings, naive datetimes, offset timestamps). [`Occupancies`]
//! validates and localizes them once, so the resolver only ever sees
//! `(date, [start, end))` pairs on the local calendar.

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

use crate::clock::{localize, parse_instant, resolve_start, weekday_from_index, TimeOfDay};
use crate::error::{Result, SlotError};
use crate::interval::{hours_to_minutes, Interval};

/// Duration of a demo booking that has no explicit end.
pub const DEFAULT_DEMO_MINUTES: u16 = 60;

/// Lifecycle of a tutoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

/// A committed class occupying both a teacher and a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub teacher_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub student_id: Option<String>,
    pub session_date: NaiveDate,
    /// `HH:MM`, `HH:MM:SS`, or a full timestamp.
    pub started_at: String,
    pub duration_hours: f64,
    #[serde(default)]
    pub status: SessionStatus,
}

/// A demo class booking. Occupies the teacher only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demo {
    #[serde(default, deserialize_with = "opt_id_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub teacher_id: Option<String>,
    /// Absolute instant; localized before comparison.
    pub scheduled_at: String,
    #[serde(default)]
    pub ends_at: Option<String>,
}

/// A recurring weekly window in which a teacher is willing to teach.
///
/// `day_of_week` counts from Sunday = 0 to Saturday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day_of_week: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl AvailabilityWindow {
    pub fn weekday(&self) -> Result<Weekday> {
        weekday_from_index(self.day_of_week)
    }

    pub fn interval(&self) -> Result<Interval> {
        Interval::new(self.start_time, self.end_time)
    }
}

/// Whose calendar an occupancy blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Student,
    Teacher,
}

/// Which kind of record produced an occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Session,
    Demo,
}

/// One normalized occupancy on the local calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyEntry {
    pub id: Option<String>,
    pub date: NaiveDate,
    pub interval: Interval,
    pub owner: Owner,
    pub kind: EntryKind,
}

impl BusyEntry {
    fn is_excluded(&self, exclude_id: Option<&str>) -> bool {
        matches!((self.id.as_deref(), exclude_id), (Some(id), Some(ex)) if id == ex)
    }
}

/// A validated snapshot of everything that can block a candidate slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occupancies {
    entries: Vec<BusyEntry>,
}

impl Occupancies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a student's classes, a teacher's classes, and the teacher's
    /// demos in one step, using the default demo length.
    pub fn build(
        student_classes: &[Session],
        teacher_classes: &[Session],
        demos: &[Demo],
        tz: Tz,
    ) -> Result<Self> {
        let mut occupancies = Self::new();
        occupancies.add_sessions(Owner::Student, student_classes, tz)?;
        occupancies.add_sessions(Owner::Teacher, teacher_classes, tz)?;
        occupancies.add_demos(demos, tz, DEFAULT_DEMO_MINUTES)?;
        Ok(occupancies)
    }

    /// Add sessions as occupancies of `owner`. Cancelled sessions are skipped.
    ///
    /// # Errors
    /// Fails on the first session with an unparseable `started_at` or a
    /// non-positive duration; nothing from the batch is added in that case.
    pub fn add_sessions(&mut self, owner: Owner, sessions: &[Session], tz: Tz) -> Result<()> {
        let mut batch = Vec::with_capacity(sessions.len());
        for session in sessions {
            if session.status == SessionStatus::Cancelled {
                tracing::trace!(id = %session.id, "skipping cancelled session");
                continue;
            }
            let start = resolve_start(&session.started_at, tz)?;
            let minutes = hours_to_minutes(session.duration_hours)?;
            batch.push(BusyEntry {
                id: Some(session.id.clone()),
                date: session.session_date,
                interval: Interval::starting_at_clipped(start, minutes)?,
                owner,
                kind: EntryKind::Session,
            });
        }
        self.entries.extend(batch);
        Ok(())
    }

    /// Add demo bookings as teacher occupancies, localized into `tz`.
    ///
    /// Both ends are localized and truncated to the minute independently, so
    /// seconds on either timestamp never shorten the demo. A demo without
    /// `ends_at` lasts `default_minutes`; one ending on a later local date is
    /// clipped to 24:00. A demo whose end is not after its start is rejected.
    pub fn add_demos(&mut self, demos: &[Demo], tz: Tz, default_minutes: u16) -> Result<()> {
        let mut batch = Vec::with_capacity(demos.len());
        for demo in demos {
            let scheduled = parse_instant(&demo.scheduled_at)?;
            let (date, start) = localize(scheduled, tz);
            let interval = match demo.ends_at.as_deref() {
                Some(raw) => {
                    let empty = || SlotError::EmptyInterval {
                        start: demo.scheduled_at.clone(),
                        end: raw.to_string(),
                    };
                    let ends = parse_instant(raw)?;
                    if ends <= scheduled {
                        return Err(empty());
                    }
                    let (end_date, end_time) = localize(ends, tz);
                    let end = if end_date > date {
                        TimeOfDay::END_OF_DAY
                    } else {
                        end_time
                    };
                    Interval::new(start, end).map_err(|_| empty())?
                }
                None => Interval::starting_at_clipped(start, default_minutes)?,
            };
            batch.push(BusyEntry {
                id: demo.id.clone(),
                date,
                interval,
                owner: Owner::Teacher,
                kind: EntryKind::Demo,
            });
        }
        self.entries.extend(batch);
        Ok(())
    }

    pub fn entries(&self) -> &[BusyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries on `date` belonging to `owner`, in insertion order.
    pub fn owned_on(&self, owner: Owner, date: NaiveDate) -> impl Iterator<Item = &BusyEntry> {
        self.entries
            .iter()
            .filter(move |e| e.owner == owner && e.date == date)
    }

    /// Whether any entry on `date` overlaps `interval`, ignoring `exclude_id`.
    pub fn blocks(&self, date: NaiveDate, interval: &Interval, exclude_id: Option<&str>) -> bool {
        self.entries.iter().any(|e| {
            e.date == date && !e.is_excluded(exclude_id) && e.interval.overlaps(interval)
        })
    }

    pub(crate) fn overlapping<'a>(
        &'a self,
        owner: Owner,
        date: NaiveDate,
        interval: &'a Interval,
        exclude_id: Option<&'a str>,
    ) -> impl Iterator<Item = &'a BusyEntry> + 'a {
        self.owned_on(owner, date)
            .filter(move |e| !e.is_excluded(exclude_id) && e.interval.overlaps(interval))
    }
}

/// Backend ids arrive as either JSON strings or integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}
