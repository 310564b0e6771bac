//! Clock-in module.
//!
//! The multi-role clock-in wizard, the payload it submits, and the
//! collaborator traits it depends on.

pub mod payload;
pub mod services;
pub mod wizard;

pub use payload::*;
pub use services::*;
pub use wizard::*;
