//! Engine configuration.
//!
//! Loaded from `TIMECARD_*` environment variables or a JSON document.

pub mod settings;

pub use settings::*;
