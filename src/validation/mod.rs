//! Clock-in validation module.
//!
//! Reference data used to validate clock-in choices:
//! - Jobsite lookup by scanned QR code
//! - Cost codes scoped per jobsite
//! - Equipment lookup by id, QR code, or kind

pub mod catalog;

pub use catalog::*;
