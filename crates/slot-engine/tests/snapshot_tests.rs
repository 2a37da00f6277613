//! Tests for snapshot loading against an in-memory occupancy source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use slot_engine::error::Result;
use slot_engine::snapshot::{DateRange, RequestGeneration, TeacherSchedule};
use slot_engine::{
    check_slot, AvailabilityWindow, Conflict, Demo, OccupancySnapshot, OccupancySource,
    Selection, Session, SessionStatus, SlotCandidate, SlotError, SnapshotLoader, TimeOfDay,
};
use tokio::sync::Notify;

// ── In-memory source ────────────────────────────────────────────────────────

#[derive(Default)]
struct MemorySource {
    students: HashMap<String, Vec<Session>>,
    teachers: HashMap<String, TeacherSchedule>,
    windows: HashMap<String, Vec<AvailabilityWindow>>,
    /// Student id whose fetch waits until `release` is notified.
    slow_student: Option<String>,
    release: Notify,
    /// Student id whose fetch fails (after any `slow_student` wait).
    failing_student: Option<String>,
    window_calls: AtomicUsize,
    fail_teachers: bool,
}

#[async_trait]
impl OccupancySource for MemorySource {
    async fn student_classes(&self, student_id: &str, _range: DateRange) -> Result<Vec<Session>> {
        if self.slow_student.as_deref() == Some(student_id) {
            self.release.notified().await;
        }
        if self.failing_student.as_deref() == Some(student_id) {
            return Err(SlotError::Source(format!("student {} unavailable", student_id)));
        }
        Ok(self.students.get(student_id).cloned().unwrap_or_default())
    }

    async fn teacher_schedule(
        &self,
        teacher_id: &str,
        _range: DateRange,
    ) -> Result<TeacherSchedule> {
        if self.fail_teachers {
            return Err(SlotError::Source("teacher endpoint returned 503".to_string()));
        }
        Ok(self.teachers.get(teacher_id).cloned().unwrap_or_default())
    }

    async fn teacher_windows(&self, teacher_id: &str) -> Result<Vec<AvailabilityWindow>> {
        self.window_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.windows.get(teacher_id).cloned().unwrap_or_default())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 17).unwrap()
}

fn session(id: &str, started_at: &str) -> Session {
    Session {
        id: id.to_string(),
        teacher_id: Some("t-1".to_string()),
        student_id: Some("s-1".to_string()),
        session_date: tuesday(),
        started_at: started_at.to_string(),
        duration_hours: 1.0,
        status: SessionStatus::Scheduled,
    }
}

fn selection(student: &str, teacher: Option<&str>) -> Selection {
    Selection {
        student_id: Some(student.to_string()),
        teacher_id: teacher.map(str::to_string),
        range: DateRange::single(tuesday()),
        with_windows: false,
    }
}

fn source() -> MemorySource {
    let mut source = MemorySource::default();
    source
        .students
        .insert("s-1".to_string(), vec![session("sess-1", "09:00")]);
    source.teachers.insert(
        "t-1".to_string(),
        TeacherSchedule {
            classes: vec![session("sess-2", "11:00")],
            demos: vec![Demo {
                id: None,
                teacher_id: Some("t-1".to_string()),
                scheduled_at: "2026-03-17T08:30:00Z".to_string(),
                ends_at: None,
            }],
        },
    );
    source
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_joins_student_and_teacher_data() {
    let loader = SnapshotLoader::new(source());

    let snapshot = loader
        .load(&selection("s-1", Some("t-1")))
        .await
        .unwrap()
        .expect("only load in flight must be current");

    assert_eq!(snapshot.student.classes.len(), 1);
    assert_eq!(snapshot.teacher.classes.len(), 1);
    assert_eq!(snapshot.teacher.demos.len(), 1);
    assert!(snapshot.windows.is_empty());
    assert_eq!(loader.source().window_calls.load(Ordering::SeqCst), 0);

    let kolkata: Tz = "Asia/Kolkata".parse().unwrap();
    let occ = snapshot.occupancies(kolkata, 60).unwrap();
    let at = |s: &str| SlotCandidate::new(tuesday(), TimeOfDay::parse(s).unwrap(), 1.0).unwrap();

    assert_eq!(check_slot(&occ, &at("09:30"), None), Conflict::Student);
    assert_eq!(check_slot(&occ, &at("11:30"), None), Conflict::Teacher);
    assert_eq!(check_slot(&occ, &at("14:30"), None), Conflict::Teacher);
    assert_eq!(check_slot(&occ, &at("12:00"), None), Conflict::None);
}

#[tokio::test]
async fn windows_are_fetched_only_when_requested() {
    let mut source = source();
    source.windows.insert(
        "t-1".to_string(),
        vec![AvailabilityWindow {
            day_of_week: 2,
            start_time: TimeOfDay::hm(9, 0).unwrap(),
            end_time: TimeOfDay::hm(17, 0).unwrap(),
        }],
    );
    let loader = SnapshotLoader::new(source);

    let mut sel = selection("s-1", Some("t-1"));
    sel.with_windows = true;
    let snapshot = loader.load(&sel).await.unwrap().unwrap();

    assert_eq!(snapshot.windows.len(), 1);
    assert_eq!(loader.source().window_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_teacher_selection_yields_empty_teacher_side() {
    let loader = SnapshotLoader::new(source());

    let snapshot = loader.load(&selection("s-1", None)).await.unwrap().unwrap();

    assert_eq!(snapshot.teacher, TeacherSchedule::default());
    assert_eq!(snapshot.student.classes.len(), 1);
}

#[tokio::test]
async fn superseded_load_is_discarded() {
    let mut source = source();
    source.slow_student = Some("slow".to_string());
    let loader = SnapshotLoader::new(source);

    let slow_selection = selection("slow", Some("t-1"));
    let first = loader.load(&slow_selection);
    let second = async {
        let result = loader.load(&selection("s-1", Some("t-1"))).await;
        loader.source().release.notify_one();
        result
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), None, "older load finished last and must be dropped");
    assert!(second.unwrap().is_some());
}

#[tokio::test]
async fn superseded_load_that_fails_is_discarded() {
    let mut source = source();
    source.slow_student = Some("slow".to_string());
    source.failing_student = Some("slow".to_string());
    let loader = SnapshotLoader::new(source);

    let slow_selection = selection("slow", Some("t-1"));
    let first = loader.load(&slow_selection);
    let second = async {
        let result = loader.load(&selection("s-1", Some("t-1"))).await;
        loader.source().release.notify_one();
        result
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, Ok(None), "stale failure must not surface");
    assert!(second.unwrap().is_some());
}

#[tokio::test]
async fn current_load_failure_is_still_reported() {
    let mut source = source();
    source.failing_student = Some("s-1".to_string());
    let loader = SnapshotLoader::new(source);

    let err = loader.load(&selection("s-1", Some("t-1"))).await.unwrap_err();

    assert_eq!(err, SlotError::Source("student s-1 unavailable".to_string()));
}

#[tokio::test]
async fn source_failure_is_propagated() {
    let mut source = source();
    source.fail_teachers = true;
    let loader = SnapshotLoader::new(source);

    let err = loader.load(&selection("s-1", Some("t-1"))).await.unwrap_err();

    assert!(matches!(err, SlotError::Source(_)));
}

#[test]
fn generation_tickets_are_monotonic() {
    let generation = RequestGeneration::new();

    let a = generation.issue();
    assert!(generation.is_current(a));

    let b = generation.issue();
    assert!(b > a);
    assert!(!generation.is_current(a));
    assert!(generation.is_current(b));
}

#[test]
fn snapshot_json_accepts_numeric_ids_and_partial_documents() {
    let json = r#"{
        "teacher": {
            "classes": [
                {"id": 17, "session_date": "2026-03-17", "started_at": "10:00:00",
                 "duration_hours": 1.5, "status": "completed"}
            ]
        }
    }"#;

    let snapshot = OccupancySnapshot::from_json_str(json).unwrap();

    assert!(snapshot.student.classes.is_empty());
    assert_eq!(snapshot.teacher.classes[0].id, "17");
    assert_eq!(snapshot.teacher.classes[0].status, SessionStatus::Completed);
    assert!(OccupancySnapshot::from_json_str("[]").is_err());
}
