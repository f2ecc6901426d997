//! Scheduling error types.
//!
//! Rejections form a closed vocabulary. Each variant has a stable
//! [`code`](ScheduleError::code) for clients and a
//! [`user_message`](ScheduleError::user_message) that is safe to show to
//! anyone; the `Display` text may carry detail meant for logs and admins.

use flock_core::error::FlockError;
use flock_core::models::shift::{ShiftStatus, SlotConflict};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("shift must start before it ends")]
    InvalidTimeRange,

    #[error("volunteer {id} not found in this organization")]
    VolunteerNotFound { id: Uuid },

    #[error("opportunity {id} not found in this organization")]
    OpportunityNotFound { id: Uuid },

    #[error("overlaps existing shift {conflicting_shift_id}")]
    TimeConflict { conflicting_shift_id: Uuid },

    #[error("volunteer has a blackout covering this date")]
    VolunteerUnavailable,

    #[error("a cleared background check is required")]
    BackgroundCheckRequired,

    #[error("background check has expired")]
    BackgroundCheckExpired,

    #[error("missing required skills: {}", missing.join(", "))]
    MissingRequiredSkills { missing: Vec<String> },

    #[error("all {volunteers_needed} slots are taken")]
    OpportunityFull { volunteers_needed: u32 },

    #[error("cannot move shift from {from:?} to {to:?}")]
    InvalidStatusTransition { from: ShiftStatus, to: ShiftStatus },

    #[error("invalid availability: {0}")]
    InvalidAvailability(String),

    #[error("scheduling did not finish in time")]
    Timeout,

    #[error(transparent)]
    Store(FlockError),
}

impl From<FlockError> for ScheduleError {
    fn from(err: FlockError) -> Self {
        match err {
            FlockError::SlotTaken(SlotConflict::VolunteerBusy { shift_id }) => {
                Self::TimeConflict {
                    conflicting_shift_id: shift_id,
                }
            }
            FlockError::SlotTaken(SlotConflict::OpportunityFull { volunteers_needed }) => {
                Self::OpportunityFull { volunteers_needed }
            }
            other => Self::Store(other),
        }
    }
}

impl ScheduleError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTimeRange => "INVALID_TIME_RANGE",
            Self::VolunteerNotFound { .. } => "VOLUNTEER_NOT_FOUND",
            Self::OpportunityNotFound { .. } => "OPPORTUNITY_NOT_FOUND",
            Self::TimeConflict { .. } => "TIME_CONFLICT",
            Self::VolunteerUnavailable => "VOLUNTEER_UNAVAILABLE",
            Self::BackgroundCheckRequired => "BACKGROUND_CHECK_REQUIRED",
            Self::BackgroundCheckExpired => "BACKGROUND_CHECK_EXPIRED",
            Self::MissingRequiredSkills { .. } => "MISSING_REQUIRED_SKILLS",
            Self::OpportunityFull { .. } => "OPPORTUNITY_FULL",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::InvalidAvailability(_) => "INVALID_AVAILABILITY",
            Self::Timeout => "TIMEOUT",
            Self::Store(err) => match err {
                FlockError::NotFound { .. } => "NOT_FOUND",
                FlockError::AlreadyExists { .. } => "ALREADY_EXISTS",
                FlockError::Validation { .. } => "VALIDATION_ERROR",
                FlockError::VersionConflict { .. } => "VERSION_CONFLICT",
                FlockError::TenantContext => "TENANT_CONTEXT",
                FlockError::SlotTaken(SlotConflict::VolunteerBusy { .. }) => "TIME_CONFLICT",
                FlockError::SlotTaken(SlotConflict::OpportunityFull { .. }) => "OPPORTUNITY_FULL",
                FlockError::WriteConflict { .. }
                | FlockError::Database(_)
                | FlockError::Internal(_) => "INTERNAL_ERROR",
            },
        }
    }

    /// Message that can be shown to any caller.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidTimeRange => "The shift must end after it starts.",
            Self::VolunteerNotFound { .. } => "Volunteer not found.",
            Self::OpportunityNotFound { .. } => "Serving opportunity not found.",
            Self::TimeConflict { .. } => {
                "This volunteer is already scheduled for an overlapping shift."
            }
            Self::VolunteerUnavailable => "This volunteer is unavailable on that date.",
            Self::BackgroundCheckRequired => {
                "This role requires a cleared background check."
            }
            Self::BackgroundCheckExpired => {
                "This volunteer's background check has expired and must be renewed."
            }
            Self::MissingRequiredSkills { .. } => {
                "This volunteer does not have the skills this role requires."
            }
            Self::OpportunityFull { .. } => "All positions for this shift are filled.",
            Self::InvalidStatusTransition { .. } => {
                "That status change is not allowed for this shift."
            }
            Self::InvalidAvailability(_) => "The availability entry is invalid.",
            Self::Store(FlockError::NotFound { .. }) => "The requested record was not found.",
            Self::Store(FlockError::VersionConflict { .. }) => {
                "This shift was changed by someone else. Refresh and try again."
            }
            Self::Store(FlockError::AlreadyExists { .. }) => "That record already exists.",
            Self::Store(FlockError::Validation { .. }) => "The request is invalid.",
            Self::Store(FlockError::TenantContext) => "Organization context is missing.",
            Self::Timeout | Self::Store(_) => "Something went wrong. Please try again.",
        }
    }

    /// True for the closed set of business-rule rejections, as opposed
    /// to storage failures and timeouts.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Timeout | Self::Store(_))
    }
}

impl From<ScheduleError> for FlockError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Store(inner) => inner,
            ScheduleError::VolunteerNotFound { id } => FlockError::not_found("volunteer", id),
            ScheduleError::OpportunityNotFound { id } => {
                FlockError::not_found("serving_opportunity", id)
            }
            ScheduleError::Timeout => FlockError::Internal(ScheduleError::Timeout.to_string()),
            other => FlockError::Validation {
                message: format!("{}: {other}", other.code()),
            },
        }
    }
}
