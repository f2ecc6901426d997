//! Error types for the Flock system.

use thiserror::Error;

use crate::models::shift::SlotConflict;

#[derive(Debug, Error)]
pub enum FlockError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The caller's last-seen version no longer matches the stored one.
    #[error("Stale write: {entity} {id} is no longer at version {expected}")]
    VersionConflict {
        entity: String,
        id: String,
        expected: u32,
    },

    /// A shift insert found, at commit time, that its volunteer or its
    /// opportunity slot was already taken.
    #[error("Shift slot taken: {0}")]
    SlotTaken(SlotConflict),

    /// A concurrent transaction wrote the same records first.
    #[error("Concurrent write to {entity}")]
    WriteConflict { entity: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlockError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type FlockResult<T> = Result<T, FlockError>;
