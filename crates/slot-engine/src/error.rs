//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Empty interval: start {start} is not before end {end}")]
    EmptyInterval { start: String, end: String },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The occupancy backend failed while a snapshot was being fetched.
    #[error("Occupancy source error: {0}")]
    Source(String),
}

pub type Result<T> = std::result::Result<T, SlotError>;
