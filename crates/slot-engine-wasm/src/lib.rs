//! WASM bindings for slot-engine.
//!
//! Exposes the single-slot conflict check, bulk start/end enumeration, and
//! free-window listing to the scheduling forms via `wasm-bindgen`. Snapshots,
//! configuration, and results cross the boundary as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```
//!
//! Every function takes an optional `configJson` (the same document the CLI
//! accepts with `--config`); when it is omitted the engine defaults apply:
//! Asia/Kolkata, a 15-minute grid from 06:00 to 22:00, and a one-hour minimum.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use slot_engine::clock::{parse_date, parse_instant, parse_weekday, weekday_from_index};
use slot_engine::{
    check_slot, find_conflicts, free_windows, target_dates, AvailabilityWindow, BulkPlanner,
    Conflict, ConflictDetail, EngineConfig, FreeWindow, LocalNow, Occupancies, OccupancySnapshot,
    SlotCandidate, TimeOfDay,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CheckDto {
    /// `false`, `"student"`, or `"teacher"`.
    conflict: Conflict,
    details: Vec<ConflictDetail>,
}

#[derive(Serialize)]
struct EndsDto {
    valid_ends: Vec<TimeOfDay>,
    suggested_end: Option<TimeOfDay>,
}

/// A weekday given either as a Sunday-based index or a name.
#[derive(Deserialize)]
#[serde(untagged)]
enum WeekdayInput {
    Index(u8),
    Name(String),
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn load_config(config_json: Option<&str>) -> Result<EngineConfig, JsValue> {
    match config_json {
        Some(json) => EngineConfig::from_json_str(json).map_err(js_err),
        None => Ok(EngineConfig::default()),
    }
}

fn load_snapshot(
    snapshot_json: &str,
    config: &EngineConfig,
) -> Result<(OccupancySnapshot, Occupancies), JsValue> {
    let snapshot = OccupancySnapshot::from_json_str(snapshot_json).map_err(js_err)?;
    let tz = config.tz().map_err(js_err)?;
    let occupancies = snapshot
        .occupancies(tz, config.default_demo_minutes)
        .map_err(js_err)?;
    Ok((snapshot, occupancies))
}

/// Parse a JSON array such as `[1, 3]` or `["mon", "wed"]`.
fn parse_weekdays_json(json: &str) -> Result<Vec<Weekday>, JsValue> {
    let inputs: Vec<WeekdayInput> = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid weekdays JSON: {}", e)))?;

    inputs
        .into_iter()
        .map(|input| match input {
            WeekdayInput::Index(i) => weekday_from_index(i),
            WeekdayInput::Name(name) => parse_weekday(&name),
        })
        .collect::<slot_engine::error::Result<Vec<_>>>()
        .map_err(js_err)
}

fn selected_dates(from: &str, to: &str, weekdays_json: &str) -> Result<Vec<NaiveDate>, JsValue> {
    let from = parse_date(from).map_err(js_err)?;
    let to = parse_date(to).map_err(js_err)?;
    let weekdays = parse_weekdays_json(weekdays_json)?;
    Ok(target_dates(from, to, &weekdays))
}

/// Build the planner; `windows` is `Some` when slots must fit the teacher's
/// weekly availability.
fn planner<'a>(
    occupancies: &'a Occupancies,
    dates: Vec<NaiveDate>,
    config: &EngineConfig,
    windows: Option<&[AvailabilityWindow]>,
    exclude_id: Option<String>,
) -> Result<BulkPlanner<'a>, JsValue> {
    let grid = config.grid().map_err(js_err)?;
    let mut planner =
        BulkPlanner::new(occupancies, dates, grid).with_min_duration(config.min_duration_minutes);
    if let Some(windows) = windows {
        planner = planner.with_windows(windows).map_err(js_err)?;
    }
    Ok(match exclude_id {
        Some(id) => planner.excluding(id),
        None => planner,
    })
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Check one candidate slot against the snapshot.
///
/// Returns `{conflict, details}` where `conflict` is `false`, `"student"`, or
/// `"teacher"`. `excludeId` names the session being edited so it does not
/// collide with itself.
#[wasm_bindgen(js_name = "checkSlot")]
pub fn check_slot_js(
    snapshot_json: &str,
    date: &str,
    start: &str,
    duration_hours: f64,
    exclude_id: Option<String>,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let config = load_config(config_json.as_deref())?;
    let (_, occupancies) = load_snapshot(snapshot_json, &config)?;
    let date = parse_date(date).map_err(js_err)?;
    let start = TimeOfDay::parse(start).map_err(js_err)?;
    let candidate = SlotCandidate::new(date, start, duration_hours).map_err(js_err)?;

    to_json(&CheckDto {
        conflict: check_slot(&occupancies, &candidate, exclude_id.as_deref()),
        details: find_conflicts(&occupancies, &candidate, exclude_id.as_deref()),
    })
}

/// Start times free on every selected date between `from` and `to`.
///
/// `weekdaysJson` is an array of Sunday-based indices or names. With
/// `useWindows`, every slot must also fit the snapshot's teacher windows.
/// When `now` (an RFC 3339 instant) is given, starts already in the past are
/// dropped. Returns a JSON array of `"HH:MM"` strings.
#[wasm_bindgen(js_name = "validStarts")]
#[allow(clippy::too_many_arguments)]
pub fn valid_starts_js(
    snapshot_json: &str,
    from: &str,
    to: &str,
    weekdays_json: &str,
    use_windows: bool,
    now: Option<String>,
    exclude_id: Option<String>,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let config = load_config(config_json.as_deref())?;
    let (snapshot, occupancies) = load_snapshot(snapshot_json, &config)?;
    let dates = selected_dates(from, to, weekdays_json)?;
    let windows = use_windows.then_some(snapshot.windows.as_slice());
    let planner = planner(&occupancies, dates, &config, windows, exclude_id)?;

    let starts = match now {
        Some(raw) => {
            let instant = parse_instant(&raw).map_err(js_err)?;
            let tz = config.tz().map_err(js_err)?;
            planner.valid_starts_after(&LocalNow::from_instant(instant, tz))
        }
        None => planner.valid_starts(),
    };
    to_json(&starts)
}

/// End times reachable from `start` on every selected date.
///
/// Returns `{valid_ends, suggested_end}`; `suggested_end` is the earliest end
/// meeting the minimum duration, or `null` when there is none. `useWindows`
/// behaves as in `validStarts`.
#[wasm_bindgen(js_name = "validEnds")]
#[allow(clippy::too_many_arguments)]
pub fn valid_ends_js(
    snapshot_json: &str,
    from: &str,
    to: &str,
    weekdays_json: &str,
    use_windows: bool,
    start: &str,
    exclude_id: Option<String>,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let config = load_config(config_json.as_deref())?;
    let (snapshot, occupancies) = load_snapshot(snapshot_json, &config)?;
    let dates = selected_dates(from, to, weekdays_json)?;
    let windows = use_windows.then_some(snapshot.windows.as_slice());
    let planner = planner(&occupancies, dates, &config, windows, exclude_id)?;
    let start = TimeOfDay::parse(start).map_err(js_err)?;

    let valid_ends = planner.valid_ends(start);
    let suggested_end = valid_ends.first().copied();
    to_json(&EndsDto {
        valid_ends,
        suggested_end,
    })
}

/// Free windows within business hours on `date`.
///
/// Returns a JSON array of `{start, end, duration_minutes}` objects.
#[wasm_bindgen(js_name = "freeWindows")]
pub fn free_windows_js(
    snapshot_json: &str,
    date: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    let config = load_config(config_json.as_deref())?;
    let (_, occupancies) = load_snapshot(snapshot_json, &config)?;
    let date = parse_date(date).map_err(js_err)?;
    let grid = config.grid().map_err(js_err)?;

    let windows: Vec<FreeWindow> = free_windows(&occupancies, date, &grid);
    to_json(&windows)
}
