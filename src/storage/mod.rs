//! Storage module.
//!
//! Log record models, patch record shapes, and the persistence collaborator
//! trait with an in-memory implementation.

pub mod memory;
pub mod models;
pub mod patches;
pub mod store;

pub use memory::*;
pub use models::*;
pub use patches::*;
pub use store::*;
