//! Structured logging with session context.
//!
//! Provides logging macros and utilities that include the session id and,
//! where known, the employee and log kind in every log message.

pub mod structured;

pub use structured::*;
