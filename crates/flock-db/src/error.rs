//! Database-specific error types and conversions.

use flock_core::error::FlockError;
use flock_core::models::shift::SlotConflict;
use surrealdb_types::QueryError;
use uuid::Uuid;

/// Marker thrown by the guarded shift insert when the opportunity is full.
pub(crate) const THROW_OPPORTUNITY_FULL: &str = "OPPORTUNITY_FULL";
/// Marker thrown by the guarded shift insert, followed by the blocking
/// shift's id.
pub(crate) const THROW_VOLUNTEER_BUSY: &str = "VOLUNTEER_BUSY:";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unique constraint violated on {entity}")]
    Duplicate { entity: String },

    #[error("Malformed stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Guarded insert refused: {0}")]
    SlotTaken(SlotConflict),

    #[error("Transaction on {entity} lost to a concurrent writer")]
    WriteConflict { entity: String },
}

impl DbError {
    /// Classify a failed statement. Unique index violations become
    /// [`DbError::Duplicate`]; everything else is a generic query failure.
    pub(crate) fn from_check(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl DbError {
    /// Classify the statement errors of a failed guarded shift insert.
    ///
    /// A failed transaction marks every statement as failed; only one of
    /// them carries the real cause, so all of them are inspected.
    pub(crate) fn from_guarded_insert(
        entity: &str,
        volunteers_needed: u32,
        errors: impl IntoIterator<Item = surrealdb::Error>,
    ) -> Self {
        let mut fallback = None;
        for err in errors {
            if let Some(conflict) = thrown_slot_conflict(&err, volunteers_needed) {
                return DbError::SlotTaken(conflict);
            }
            if matches!(err.query_details(), Some(QueryError::TransactionConflict)) {
                return DbError::WriteConflict {
                    entity: entity.into(),
                };
            }
            if fallback.is_none() || !is_not_executed(&err) {
                fallback = Some(err);
            }
        }
        match fallback {
            Some(err) => DbError::from_check(entity, err),
            None => DbError::Query(format!("{entity} insert failed without an error")),
        }
    }
}

fn is_not_executed(err: &surrealdb::Error) -> bool {
    matches!(err.query_details(), Some(QueryError::NotExecuted))
}

fn thrown_slot_conflict(err: &surrealdb::Error, volunteers_needed: u32) -> Option<SlotConflict> {
    let message = err.message();
    if message.contains(THROW_OPPORTUNITY_FULL) {
        return Some(SlotConflict::OpportunityFull { volunteers_needed });
    }
    let (_, rest) = message.split_once(THROW_VOLUNTEER_BUSY)?;
    let id = rest.get(..36).and_then(|raw| Uuid::parse_str(raw).ok())?;
    Some(SlotConflict::VolunteerBusy { shift_id: id })
}

impl From<DbError> for FlockError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => FlockError::NotFound { entity, id },
            DbError::Duplicate { entity } => FlockError::AlreadyExists { entity },
            DbError::SlotTaken(conflict) => FlockError::SlotTaken(conflict),
            DbError::WriteConflict { entity } => FlockError::WriteConflict { entity },
            other => FlockError::Database(other.to_string()),
        }
    }
}
