//! Review pipeline module.
//!
//! Coordinates the manager's edit workflow over one `(date, kind)`:
//! - Fetch and snapshot
//! - Stage and commit field edits
//! - Diff, validate, and patch
//! - Refetch or cancel

pub mod context;
pub mod reconciliation;

pub use context::*;
pub use reconciliation::*;
