//! Scenarios crossing module boundaries.

pub mod util;
