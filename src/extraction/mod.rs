//! Field value extraction module.
//!
//! Strict conversion between raw input strings and typed field values.

pub mod value;

pub use value::*;
