//! Engine configuration: scheduling timezone, business hours, and durations.
//!
//! Every field has a default, so `{}` is a valid configuration:
//!
//! ```json
//! {
//!   "timezone": "Asia/Kolkata",
//!   "step_minutes": 15,
//!   "opens": "06:00",
//!   "closes": "22:00",
//!   "min_duration_minutes": 60,
//!   "default_demo_minutes": 60
//! }
//! ```

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::{parse_timezone, TimeOfDay};
use crate::error::{Result, SlotError};
use crate::grid::{SlotGrid, DEFAULT_STEP_MINUTES};
use crate::occupancy::DEFAULT_DEMO_MINUTES;
use crate::plan::MIN_DURATION_MINUTES;

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// IANA zone that demo timestamps and "now" are localized into.
    pub timezone: String,
    pub step_minutes: u16,
    pub opens: TimeOfDay,
    pub closes: TimeOfDay,
    pub min_duration_minutes: u16,
    pub default_demo_minutes: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let grid = SlotGrid::default();
        EngineConfig {
            timezone: DEFAULT_TIMEZONE.to_string(),
            step_minutes: DEFAULT_STEP_MINUTES,
            opens: grid.opens(),
            closes: grid.closes(),
            min_duration_minutes: MIN_DURATION_MINUTES,
            default_demo_minutes: DEFAULT_DEMO_MINUTES,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| SlotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the timezone, the grid, and the durations.
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        self.grid()?;
        if self.default_demo_minutes == 0 {
            return Err(SlotError::Config(
                "default_demo_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    pub fn grid(&self) -> Result<SlotGrid> {
        SlotGrid::new(self.step_minutes, self.opens, self.closes)
    }
}
