//! Timecard Core - timesheet log reconciliation and clock-in state machine
//!
//! This crate provides the core of a workforce time-tracking application.
//! The implementation prioritizes:
//!
//! 1. **No lost edits** - Working copy and snapshot are separate values; only
//!    cancel discards committed edits
//! 2. **Logging** - Every decision point logged with session context
//! 3. **Minimal patches** - Only fields that changed are sent to persistence
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Review workflow: snapshot, edit, save, cancel
//! - `adapters` - Per-kind flatten/reconstruct and field access
//! - `editing` - Staged field input and review selection
//! - `extraction` - Strict parsing and formatting of field values
//! - `storage` - Log record models, patch shapes, persistence trait
//! - `clock_in` - Multi-role clock-in wizard and its collaborators
//! - `routing` - Clock-in step routing per role
//! - `validation` - Jobsite, cost code, and equipment catalog
//! - `config` - Engine settings from environment or JSON
//! - `logging` - Structured logging with session context

pub mod adapters;
pub mod clock_in;
pub mod config;
pub mod editing;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod pipeline;
pub mod routing;
pub mod storage;
pub mod validation;

pub use adapters::{AdapterRegistry, EditContext, LogAdapter};
pub use clock_in::{ClockInRequest, ClockInServices, ClockInWizard};
pub use config::EngineConfig;
pub use error::{Result, TimecardError};
pub use pipeline::{ReconciliationController, SaveOutcome};
pub use storage::{InMemoryLogStore, LogStore};

/// Initialize the process-wide logger at the configured level.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(config: &EngineConfig) -> Result<()> {
    let level = config.level_filter()?;
    let _ = env_logger::builder()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent() {
        let config = EngineConfig::default();
        init_logger(&config).unwrap();
        init_logger(&config).unwrap();
    }

    #[test]
    fn test_init_logger_rejects_bad_level() {
        let config = EngineConfig {
            log_level: "chatty".to_string(),
            ..EngineConfig::default()
        };
        assert!(init_logger(&config).is_err());
    }
}
