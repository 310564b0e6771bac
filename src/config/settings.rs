//! Engine settings.

use std::str::FromStr;

use chrono::{Duration, FixedOffset};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::adapters::EditContext;
use crate::error::{Result, TimecardError};

pub const ENV_LOG_LEVEL: &str = "TIMECARD_LOG_LEVEL";
pub const ENV_UTC_OFFSET_MINUTES: &str = "TIMECARD_UTC_OFFSET_MINUTES";
pub const ENV_SCAN_ERROR_SECS: &str = "TIMECARD_SCAN_ERROR_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `off`, `error`, `warn`, `info`, `debug`, or `trace`.
    pub log_level: String,
    /// Local offset in which time-of-day edits are read and written.
    pub utc_offset_minutes: i32,
    /// How long a scan-failed message stays visible.
    pub scan_error_display_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            utc_offset_minutes: 0,
            scan_error_display_secs: 4,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `TIMECARD_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = level.trim().to_ascii_lowercase();
        }
        if let Some(raw) = lookup(ENV_UTC_OFFSET_MINUTES) {
            config.utc_offset_minutes = raw.trim().parse().map_err(|_| {
                TimecardError::Config(format!("{ENV_UTC_OFFSET_MINUTES} is not an integer: {raw:?}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_SCAN_ERROR_SECS) {
            config.scan_error_display_secs = raw.trim().parse().map_err(|_| {
                TimecardError::Config(format!("{ENV_SCAN_ERROR_SECS} is not a whole number: {raw:?}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TimecardError::Config(format!("malformed config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.level_filter()?;
        self.offset()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| TimecardError::Config(format!("unknown log level {:?}", self.log_level)))
    }

    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).ok_or_else(|| {
            TimecardError::Config(format!(
                "utc offset out of range: {} minutes",
                self.utc_offset_minutes
            ))
        })
    }

    pub fn edit_context(&self) -> Result<EditContext> {
        Ok(EditContext {
            offset: self.offset()?,
        })
    }

    pub fn scan_error_display(&self) -> Duration {
        let secs = i64::try_from(self.scan_error_display_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        Duration::seconds(secs)
    }
}
