//! Edit buffer and selection layer.
//!
//! Keyed staging of in-progress input values and the multi-select focus set
//! used during manager review. Both are owned by the reconciliation
//! controller; nothing here touches the working copy.

pub mod buffer;
pub mod selection;

pub use buffer::*;
pub use selection::*;
