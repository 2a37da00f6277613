//! `slots` CLI - run the scheduling resolver against JSON occupancy snapshots.
//!
//! ## Usage
//!
//! ```sh
//! # Does Tuesday 09:00 for 1h collide with anything? (snapshot on stdin)
//! cat snapshot.json | slots check --date 2026-03-17 --start 09:00 --duration 1
//!
//! # Same check while rescheduling session 42 (it may not conflict with itself)
//! slots check -s snapshot.json --date 2026-03-17 --start 09:00 --duration 1 --exclude 42
//!
//! # Starts free on every Monday and Wednesday in March, and ends from 11:00
//! slots plan -s snapshot.json --from 2026-03-01 --to 2026-03-31 \
//!     --weekdays mon,wed --start 11:00
//!
//! # Free windows for one day, at least 90 minutes long
//! slots free -s snapshot.json --date 2026-03-16 --min-minutes 90
//!
//! # Business hours / timezone from a config file, with debug logging
//! slots --config engine.json -vv plan -s snapshot.json \
//!     --from 2026-03-01 --to 2026-03-31 --weekdays fri
//! ```

use anyhow::{Context, Result};
use chrono::Weekday;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use slot_engine::clock::{parse_date, parse_instant, parse_timezone, parse_weekday};
use slot_engine::{
    check_slot, find_conflicts, free_windows, target_dates, BulkPlanner, Conflict,
    ConflictDetail, EngineConfig, FreeWindow, LocalNow, Occupancies, OccupancySnapshot,
    SlotCandidate, TimeOfDay,
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Tutoring-session conflict checks and bulk slot planning"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON engine configuration (timezone, business hours, durations)
    #[arg(long, global = true)]
    config: Option<String>,

    /// IANA timezone for demo localization; overrides the config file
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a single slot for student/teacher conflicts
    Check {
        /// Occupancy snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        snapshot: Option<String>,
        /// Session date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Start time (HH:MM)
        #[arg(long)]
        start: String,
        /// Duration in hours (e.g. 1.5)
        #[arg(long)]
        duration: f64,
        /// Session id to ignore (the session being rescheduled)
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Enumerate starts (and ends) free on every selected date
    Plan {
        /// Occupancy snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        snapshot: Option<String>,
        /// First date of the range (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last date of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: String,
        /// Comma-separated weekdays (mon,tue,... or 0-6 with 0 = Sunday)
        #[arg(long)]
        weekdays: String,
        /// Chosen start; also lists the valid ends from it
        #[arg(long)]
        start: Option<String>,
        /// Current instant (RFC 3339); starts at or before it are dropped
        #[arg(long)]
        now: Option<String>,
        /// Restrict slots to the teacher's weekly windows from the snapshot
        #[arg(long)]
        use_windows: bool,
        /// Series id to ignore while re-planning it
        #[arg(long)]
        exclude: Option<String>,
    },
    /// List free windows within business hours for one date
    Free {
        /// Occupancy snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        snapshot: Option<String>,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Only list windows at least this long
        #[arg(long, default_value_t = 0)]
        min_minutes: u16,
    },
}

#[derive(Serialize)]
struct CheckOutput {
    conflict: Conflict,
    details: Vec<ConflictDetail>,
}

#[derive(Serialize)]
struct PlanOutput {
    dates: Vec<String>,
    valid_starts: Vec<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_ends: Option<Vec<TimeOfDay>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_end: Option<TimeOfDay>,
}

#[derive(Serialize)]
struct FreeOutput {
    date: String,
    free: Vec<FreeWindow>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.timezone.as_deref())?;
    let tz = config.tz()?;
    let grid = config.grid()?;

    let output = match cli.command {
        Commands::Check {
            snapshot,
            date,
            start,
            duration,
            exclude,
        } => {
            let (_, occupancies) = load_snapshot(snapshot.as_deref(), &config)?;
            let date = parse_date(&date)?;
            let start = TimeOfDay::parse(&start)?;
            let candidate = SlotCandidate::new(date, start, duration)
                .context("Invalid candidate slot")?;

            let out = CheckOutput {
                conflict: check_slot(&occupancies, &candidate, exclude.as_deref()),
                details: find_conflicts(&occupancies, &candidate, exclude.as_deref()),
            };
            serde_json::to_string_pretty(&out)?
        }
        Commands::Plan {
            snapshot,
            from,
            to,
            weekdays,
            start,
            now,
            use_windows,
            exclude,
        } => {
            let (snapshot, occupancies) = load_snapshot(snapshot.as_deref(), &config)?;
            let weekdays = parse_weekdays(&weekdays)?;
            let dates = target_dates(parse_date(&from)?, parse_date(&to)?, &weekdays);

            let mut planner = BulkPlanner::new(&occupancies, dates, grid)
                .with_min_duration(config.min_duration_minutes);
            if use_windows {
                planner = planner
                    .with_windows(&snapshot.windows)
                    .context("Invalid availability window in snapshot")?;
            }
            if let Some(id) = exclude {
                planner = planner.excluding(id);
            }

            let valid_starts = match now.as_deref() {
                Some(raw) => {
                    let instant = parse_instant(raw)?;
                    planner.valid_starts_after(&LocalNow::from_instant(instant, tz))
                }
                None => planner.valid_starts(),
            };
            let start = start.as_deref().map(TimeOfDay::parse).transpose()?;
            let valid_ends = start.map(|s| planner.valid_ends(s));
            let suggested_end = valid_ends.as_ref().and_then(|ends| ends.first().copied());

            let out = PlanOutput {
                dates: planner.dates().iter().map(|d| d.to_string()).collect(),
                valid_starts,
                start,
                valid_ends,
                suggested_end,
            };
            serde_json::to_string_pretty(&out)?
        }
        Commands::Free {
            snapshot,
            date,
            min_minutes,
        } => {
            let (_, occupancies) = load_snapshot(snapshot.as_deref(), &config)?;
            let date = parse_date(&date)?;
            let free = free_windows(&occupancies, date, &grid)
                .into_iter()
                .filter(|w| w.duration_minutes >= min_minutes)
                .collect();
            serde_json::to_string_pretty(&FreeOutput {
                date: date.to_string(),
                free,
            })?
        }
    };

    println!("{}", output);
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Load the engine config, applying the `--timezone` override.
fn load_config(path: Option<&str>, timezone: Option<&str>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            EngineConfig::from_json_str(&json)
                .with_context(|| format!("Invalid config file: {}", path))?
        }
        None => EngineConfig::default(),
    };
    if let Some(tz) = timezone {
        parse_timezone(tz)?;
        config.timezone = tz.to_string();
    }
    tracing::debug!(?config, "engine configuration");
    Ok(config)
}

fn load_snapshot(
    path: Option<&str>,
    config: &EngineConfig,
) -> Result<(OccupancySnapshot, Occupancies)> {
    let json = read_input(path)?;
    let snapshot = OccupancySnapshot::from_json_str(&json).context("Failed to parse snapshot")?;
    let occupancies = snapshot
        .occupancies(config.tz()?, config.default_demo_minutes)
        .context("Invalid occupancy record in snapshot")?;
    Ok((snapshot, occupancies))
}

/// Parse `mon,wed,fri` (or Sunday-based indices) into weekdays.
fn parse_weekdays(raw: &str) -> Result<Vec<Weekday>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_weekday(part).map_err(anyhow::Error::from))
        .collect()
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
