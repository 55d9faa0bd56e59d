use std::env;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult};

pub const CONFIG_ENV: &str = "CALCULATE_ALL_CONFIG";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

/// Runtime settings, read as JSON from `CALCULATE_ALL_CONFIG`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// First day of a week bucket.
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
    /// Backfill empty periods when grouping by a time bucket.
    #[serde(default = "default_true")]
    pub series: bool,
}

fn default_database_path() -> String {
    ":memory:".to_string()
}

fn default_week_start() -> Weekday {
    Weekday::Mon
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: default_database_path(),
            week_start: default_week_start(),
            series: true,
        }
    }
}

impl Settings {
    /// Defaults, overlaid by `CALCULATE_ALL_CONFIG` JSON when set; a
    /// `DATABASE_PATH` variable wins over both.
    pub fn from_env() -> CalcResult<Self> {
        let mut settings = match env::var(CONFIG_ENV) {
            Ok(raw) => Self::from_json(&raw)?,
            Err(_) => Settings::default(),
        };
        if let Ok(path) = env::var(DATABASE_PATH_ENV) {
            settings.database_path = path;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(json: &str) -> CalcResult<Self> {
        let settings: Settings = serde_json::from_str(json)
            .map_err(|e| CalcError::config(format!("Failed to parse {CONFIG_ENV} JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if self.database_path.trim().is_empty() {
            return Err(CalcError::config("database_path must be non-empty"));
        }
        Ok(())
    }
}
