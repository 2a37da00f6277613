//! # slot-engine
//!
//! Double-booking detection and slot enumeration for tutoring schedules.
//!
//! Teachers and students are occupied by committed sessions; teachers are
//! additionally occupied by demo bookings. The engine answers two questions
//! over an in-memory snapshot of those occupancies:
//!
//! 1. Does a proposed slot collide with anything? ([`check_slot`])
//! 2. For a recurring request over many dates, which quarter-hour starts and
//!    which ends are free on every date? ([`BulkPlanner`])
//!
//! Both are pure functions of their inputs. Timezones and "now" are explicit
//! parameters, never ambient state.
//!
//! ## Modules
//!
//! - [`clock`] - time-of-day values, instant localization, past-time filtering
//! - [`interval`] - half-open intervals and the overlap rule
//! - [`occupancy`] - session/demo records and their normalized form
//! - [`conflict`] - single-slot check
//! - [`grid`] - the quarter-hour slot grid
//! - [`plan`] - multi-date start/end enumeration
//! - [`freebusy`] - free windows within business hours
//! - [`snapshot`] - async snapshot loading with stale-result discard
//! - [`config`] - engine configuration
//! - [`error`] - Error types

pub mod clock;
pub mod config;
pub mod conflict;
pub mod error;
pub mod freebusy;
pub mod grid;
pub mod interval;
pub mod occupancy;
pub mod plan;
pub mod snapshot;

pub use clock::{LocalNow, TimeOfDay};
pub use config::EngineConfig;
pub use conflict::{check_slot, find_conflicts, Conflict, ConflictDetail, SlotCandidate};
pub use error::SlotError;
pub use freebusy::{first_free_window, free_windows, FreeWindow};
pub use grid::SlotGrid;
pub use interval::Interval;
pub use occupancy::{
    AvailabilityWindow, BusyEntry, Demo, Occupancies, Owner, Session, SessionStatus,
};
pub use plan::{target_dates, BulkPlanner};
pub use snapshot::{OccupancySnapshot, OccupancySource, Selection, SnapshotLoader};
