//! Tests for the single-slot double-booking check.

use chrono::NaiveDate;
use chrono_tz::Tz;
use slot_engine::occupancy::{EntryKind, DEFAULT_DEMO_MINUTES};
use slot_engine::{
    check_slot, find_conflicts, Conflict, Demo, Occupancies, Owner, Session, SessionStatus,
    SlotCandidate, SlotError, TimeOfDay,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn kolkata() -> Tz {
    "Asia/Kolkata".parse().unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Monday 2026-03-16.
fn monday() -> NaiveDate {
    date(2026, 3, 16)
}

fn session(id: &str, on: NaiveDate, started_at: &str, hours: f64) -> Session {
    Session {
        id: id.to_string(),
        teacher_id: Some("t-1".to_string()),
        student_id: Some("s-1".to_string()),
        session_date: on,
        started_at: started_at.to_string(),
        duration_hours: hours,
        status: SessionStatus::Scheduled,
    }
}

fn demo(scheduled_at: &str, ends_at: Option<&str>) -> Demo {
    Demo {
        id: Some("demo-1".to_string()),
        teacher_id: Some("t-1".to_string()),
        scheduled_at: scheduled_at.to_string(),
        ends_at: ends_at.map(str::to_string),
    }
}

fn candidate(on: NaiveDate, start: &str, hours: f64) -> SlotCandidate {
    SlotCandidate::new(on, TimeOfDay::parse(start).unwrap(), hours).unwrap()
}

// ── Overlap semantics ───────────────────────────────────────────────────────

#[test]
fn overlapping_student_class_reports_student() {
    let occ = Occupancies::build(&[session("c1", monday(), "10:00", 1.0)], &[], &[], kolkata())
        .unwrap();

    let result = check_slot(&occ, &candidate(monday(), "10:30", 1.0), None);

    assert_eq!(result, Conflict::Student);
}

#[test]
fn overlapping_teacher_class_reports_teacher() {
    let occ = Occupancies::build(&[], &[session("c1", monday(), "10:00", 1.0)], &[], kolkata())
        .unwrap();

    let result = check_slot(&occ, &candidate(monday(), "09:30", 1.0), None);

    assert_eq!(result, Conflict::Teacher);
}

#[test]
fn back_to_back_slots_do_not_conflict() {
    let occ = Occupancies::build(
        &[session("c1", monday(), "10:00", 1.0)],
        &[session("c2", monday(), "12:00", 1.0)],
        &[],
        kolkata(),
    )
    .unwrap();

    // Ends exactly at 10:00 and starts exactly at 11:00 / ends at 12:00.
    assert_eq!(check_slot(&occ, &candidate(monday(), "09:00", 1.0), None), Conflict::None);
    assert_eq!(check_slot(&occ, &candidate(monday(), "11:00", 1.0), None), Conflict::None);
}

#[test]
fn other_dates_never_conflict() {
    let occ = Occupancies::build(&[session("c1", monday(), "10:00", 2.0)], &[], &[], kolkata())
        .unwrap();

    let tuesday = date(2026, 3, 17);
    assert_eq!(check_slot(&occ, &candidate(tuesday, "10:00", 2.0), None), Conflict::None);
}

#[test]
fn student_conflict_wins_over_teacher_conflict() {
    let occ = Occupancies::build(
        &[session("student-class", monday(), "10:00", 1.0)],
        &[session("teacher-class", monday(), "10:00", 1.0)],
        &[],
        kolkata(),
    )
    .unwrap();

    assert_eq!(check_slot(&occ, &candidate(monday(), "10:15", 0.5), None), Conflict::Student);

    // Both collisions are still visible to callers that ask for them.
    let details = find_conflicts(&occ, &candidate(monday(), "10:15", 0.5), None);
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].entry.owner, Owner::Student);
    assert_eq!(details[1].entry.owner, Owner::Teacher);
    assert_eq!(details[0].overlap_minutes, 30);
}

#[test]
fn fractional_durations_are_respected() {
    // 1.5h from 10:00 ends at 11:30.
    let occ = Occupancies::build(&[session("c1", monday(), "10:00", 1.5)], &[], &[], kolkata())
        .unwrap();

    assert_eq!(check_slot(&occ, &candidate(monday(), "11:15", 1.0), None), Conflict::Student);
    assert_eq!(check_slot(&occ, &candidate(monday(), "11:30", 1.0), None), Conflict::None);
}

#[test]
fn cancelled_sessions_never_block() {
    let mut cancelled = session("c1", monday(), "10:00", 1.0);
    cancelled.status = SessionStatus::Cancelled;
    let occ = Occupancies::build(&[cancelled], &[], &[], kolkata()).unwrap();

    assert!(occ.is_empty());
    assert_eq!(check_slot(&occ, &candidate(monday(), "10:00", 1.0), None), Conflict::None);
}

// ── Self-exclusion ──────────────────────────────────────────────────────────

#[test]
fn rescheduling_a_session_onto_itself_is_not_a_conflict() {
    let tuesday = date(2026, 3, 17);
    let occ = Occupancies::build(&[session("sess-42", tuesday, "09:00", 1.0)], &[], &[], kolkata())
        .unwrap();

    let slot = candidate(tuesday, "09:00", 1.0);
    assert_eq!(check_slot(&occ, &slot, Some("sess-42")), Conflict::None);
    assert_eq!(check_slot(&occ, &slot, None), Conflict::Student);
}

#[test]
fn exclusion_only_skips_the_matching_session() {
    let occ = Occupancies::build(
        &[session("sess-42", monday(), "09:00", 1.0)],
        &[session("other", monday(), "09:30", 1.0)],
        &[],
        kolkata(),
    )
    .unwrap();

    let slot = candidate(monday(), "09:00", 1.0);
    assert_eq!(check_slot(&occ, &slot, Some("sess-42")), Conflict::Teacher);
}

// ── Demos ───────────────────────────────────────────────────────────────────

#[test]
fn demo_without_end_lasts_one_hour() {
    // 08:30Z is 14:00 in Kolkata.
    let occ = Occupancies::build(&[], &[], &[demo("2026-03-16T08:30:00Z", None)], kolkata())
        .unwrap();

    let entry = &occ.entries()[0];
    assert_eq!(entry.kind, EntryKind::Demo);
    assert_eq!(entry.interval.duration_minutes(), DEFAULT_DEMO_MINUTES);

    let overlapping = SlotCandidate::new(monday(), TimeOfDay::hm(13, 30).unwrap(), 0.75).unwrap();
    assert_eq!(check_slot(&occ, &overlapping, None), Conflict::Teacher);

    assert_eq!(check_slot(&occ, &candidate(monday(), "14:30", 1.0), None), Conflict::Teacher);
    assert_eq!(check_slot(&occ, &candidate(monday(), "15:00", 1.0), None), Conflict::None);
}

#[test]
fn demo_timestamps_are_localized_before_comparison() {
    let occ = Occupancies::build(&[], &[], &[demo("2026-03-16T08:30:00Z", None)], kolkata())
        .unwrap();

    // Un-localized, the demo would sit at 08:30 and this slot would collide.
    assert_eq!(check_slot(&occ, &candidate(monday(), "08:00", 1.0), None), Conflict::None);

    // The same instant seen from UTC does sit at 08:30.
    let occ_utc = Occupancies::build(&[], &[], &[demo("2026-03-16T08:30:00Z", None)], Tz::UTC)
        .unwrap();
    assert_eq!(check_slot(&occ_utc, &candidate(monday(), "08:00", 1.0), None), Conflict::Teacher);
}

#[test]
fn demo_with_explicit_end_uses_it() {
    // 14:00-14:30 IST.
    let occ = Occupancies::build(
        &[],
        &[],
        &[demo("2026-03-16T08:30:00Z", Some("2026-03-16T09:00:00Z"))],
        kolkata(),
    )
    .unwrap();

    assert_eq!(check_slot(&occ, &candidate(monday(), "14:30", 1.0), None), Conflict::None);
    assert_eq!(check_slot(&occ, &candidate(monday(), "14:15", 1.0), None), Conflict::Teacher);
}

#[test]
fn demo_seconds_do_not_shorten_the_block() {
    // 14:00:30-15:00:00 IST still blocks the whole 14:00-15:00 hour.
    let occ = Occupancies::build(
        &[],
        &[],
        &[demo("2026-03-16T08:30:30Z", Some("2026-03-16T09:30:00Z"))],
        kolkata(),
    )
    .unwrap();

    let entry = &occ.entries()[0];
    assert_eq!(entry.interval.start(), TimeOfDay::hm(14, 0).unwrap());
    assert_eq!(entry.interval.end(), TimeOfDay::hm(15, 0).unwrap());
    assert_eq!(check_slot(&occ, &candidate(monday(), "14:45", 0.25), None), Conflict::Teacher);
}

#[test]
fn demo_ending_after_local_midnight_is_clipped() {
    // 23:30 IST to 00:30 IST the next day.
    let occ = Occupancies::build(
        &[],
        &[],
        &[demo("2026-03-16T18:00:00Z", Some("2026-03-16T19:00:00Z"))],
        kolkata(),
    )
    .unwrap();

    let entry = &occ.entries()[0];
    assert_eq!(entry.date, monday());
    assert_eq!(entry.interval.end(), TimeOfDay::END_OF_DAY);
    assert_eq!(entry.interval.duration_minutes(), 30);
}

#[test]
fn demo_ending_before_it_starts_is_rejected() {
    let err = Occupancies::build(
        &[],
        &[],
        &[demo("2026-03-16T08:30:00Z", Some("2026-03-16T08:00:00Z"))],
        kolkata(),
    )
    .unwrap_err();

    assert!(matches!(err, SlotError::EmptyInterval { .. }));
}

// ── Input validation ────────────────────────────────────────────────────────

#[test]
fn zero_and_negative_durations_are_rejected() {
    let start = TimeOfDay::hm(10, 0).unwrap();
    for hours in [0.0, -1.0, f64::NAN] {
        let result = SlotCandidate::new(monday(), start, hours);
        assert!(
            matches!(result, Err(SlotError::InvalidDuration(_))),
            "{} hours should be rejected",
            hours
        );
    }
}

#[test]
fn candidate_running_past_midnight_is_rejected() {
    let start = TimeOfDay::hm(23, 30).unwrap();
    assert!(SlotCandidate::new(monday(), start, 1.0).is_err());
}

#[test]
fn malformed_session_start_is_rejected() {
    let err = Occupancies::build(&[session("c1", monday(), "10am", 1.0)], &[], &[], kolkata())
        .unwrap_err();

    assert_eq!(err, SlotError::InvalidTime("10am".to_string()));
}

#[test]
fn conflict_serializes_to_form_shape() {
    assert_eq!(serde_json::to_string(&Conflict::None).unwrap(), "false");
    assert_eq!(serde_json::to_string(&Conflict::Student).unwrap(), r#""student""#);
    assert_eq!(serde_json::to_string(&Conflict::Teacher).unwrap(), r#""teacher""#);
}
