//! Domain models for Flock.
//!
//! These are the core types shared across all crates.

pub mod availability;
pub mod opportunity;
pub mod organization;
pub mod shift;
pub mod volunteer;
