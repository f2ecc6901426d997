//! Flock Scheduling — volunteer shift validation, optimistic-locked
//! shift updates, status changes and availability management.

pub mod config;
pub mod error;
mod locks;
pub mod rules;
pub mod service;

pub use config::SchedulingConfig;
pub use error::ScheduleError;
pub use rules::{OrgContext, ShiftRequest};
pub use service::{NewAvailability, SchedulingService, ShiftChanges};
