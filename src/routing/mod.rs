//! Clock-in routing module.
//!
//! Determines the wizard path for each role:
//! - General and mechanic: cost code, then verification
//! - Truck: cost code, labor type, truck equipment, verification
//! - Tasco: cost code, shift, material, verification

pub mod decision;

pub use decision::*;
