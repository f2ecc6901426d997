//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        name: "scheduling_lookup_indexes",
        sql: SCHEMA_V2,
    },
    Migration {
        version: 3,
        name: "shift_slot_claims",
        sql: SCHEMA_V3,
    },
];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations (global scope, tenant boundary)
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD slug ON TABLE organization TYPE string;
DEFINE FIELD metadata ON TABLE organization TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_slug ON TABLE organization \
    COLUMNS slug UNIQUE;

-- =======================================================================
-- Volunteers (organization scope)
-- =======================================================================
DEFINE TABLE volunteer SCHEMAFULL;
DEFINE FIELD organization_id ON TABLE volunteer TYPE string;
DEFINE FIELD name ON TABLE volunteer TYPE string;
DEFINE FIELD email ON TABLE volunteer TYPE option<string>;
DEFINE FIELD skills ON TABLE volunteer TYPE array DEFAULT [];
DEFINE FIELD skills.* ON TABLE volunteer TYPE string;
DEFINE FIELD background_check_status ON TABLE volunteer TYPE string \
    ASSERT $value IN ['NotStarted', 'InProgress', 'Cleared', 'Flagged', \
    'Expired'];
DEFINE FIELD background_check_expires_on ON TABLE volunteer \
    TYPE option<string>;
DEFINE FIELD is_active ON TABLE volunteer TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE volunteer TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE volunteer TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Serving opportunities (organization scope)
-- =======================================================================
DEFINE TABLE serving_opportunity SCHEMAFULL;
DEFINE FIELD organization_id ON TABLE serving_opportunity TYPE string;
DEFINE FIELD name ON TABLE serving_opportunity TYPE string;
DEFINE FIELD category ON TABLE serving_opportunity TYPE option<string>;
DEFINE FIELD required_skills ON TABLE serving_opportunity TYPE array \
    DEFAULT [];
DEFINE FIELD required_skills.* ON TABLE serving_opportunity TYPE string;
DEFINE FIELD volunteers_needed ON TABLE serving_opportunity TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD is_active ON TABLE serving_opportunity TYPE bool \
    DEFAULT true;
DEFINE FIELD created_at ON TABLE serving_opportunity TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE serving_opportunity TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Volunteer shifts (organization scope, never hard-deleted)
-- =======================================================================
DEFINE TABLE volunteer_shift SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update FULL
        FOR delete NONE;
DEFINE FIELD organization_id ON TABLE volunteer_shift TYPE string;
DEFINE FIELD volunteer_id ON TABLE volunteer_shift TYPE string;
DEFINE FIELD opportunity_id ON TABLE volunteer_shift TYPE string;
DEFINE FIELD location_id ON TABLE volunteer_shift TYPE option<string>;
DEFINE FIELD shift_date ON TABLE volunteer_shift TYPE string;
DEFINE FIELD start_time ON TABLE volunteer_shift TYPE string;
DEFINE FIELD end_time ON TABLE volunteer_shift TYPE string;
DEFINE FIELD status ON TABLE volunteer_shift TYPE string \
    ASSERT $value IN ['Scheduled', 'Confirmed', 'CheckedIn', \
    'Completed', 'Cancelled', 'NoShow'];
DEFINE FIELD notes ON TABLE volunteer_shift TYPE option<string>;
DEFINE FIELD checked_in_at ON TABLE volunteer_shift \
    TYPE option<datetime>;
DEFINE FIELD version ON TABLE volunteer_shift TYPE int DEFAULT 1;
DEFINE FIELD created_at ON TABLE volunteer_shift TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE volunteer_shift TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Volunteer availability (organization scope)
-- =======================================================================
DEFINE TABLE volunteer_availability SCHEMAFULL;
DEFINE FIELD organization_id ON TABLE volunteer_availability \
    TYPE string;
DEFINE FIELD volunteer_id ON TABLE volunteer_availability TYPE string;
DEFINE FIELD kind ON TABLE volunteer_availability TYPE string \
    ASSERT $value IN ['Recurring', 'Blackout'];
DEFINE FIELD day_of_week ON TABLE volunteer_availability \
    TYPE option<int>;
DEFINE FIELD start_time ON TABLE volunteer_availability \
    TYPE option<string>;
DEFINE FIELD end_time ON TABLE volunteer_availability \
    TYPE option<string>;
DEFINE FIELD start_date ON TABLE volunteer_availability \
    TYPE option<string>;
DEFINE FIELD end_date ON TABLE volunteer_availability \
    TYPE option<string>;
DEFINE FIELD is_available ON TABLE volunteer_availability TYPE bool;
DEFINE FIELD reason ON TABLE volunteer_availability TYPE option<string>;
DEFINE FIELD created_at ON TABLE volunteer_availability TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE volunteer_availability TYPE datetime \
    DEFAULT time::now();
";

// -----------------------------------------------------------------------
// Schema v2 — lookup indexes used by the scheduling checks
// -----------------------------------------------------------------------

const SCHEMA_V2: &str = "\
DEFINE INDEX idx_volunteer_org ON TABLE volunteer \
    COLUMNS organization_id;
DEFINE INDEX idx_opportunity_org ON TABLE serving_opportunity \
    COLUMNS organization_id;
DEFINE INDEX idx_shift_volunteer_date ON TABLE volunteer_shift \
    COLUMNS organization_id, volunteer_id, shift_date;
DEFINE INDEX idx_shift_opportunity_date ON TABLE volunteer_shift \
    COLUMNS organization_id, opportunity_id, shift_date;
DEFINE INDEX idx_availability_volunteer ON TABLE volunteer_availability \
    COLUMNS organization_id, volunteer_id;
";

// -----------------------------------------------------------------------
// Schema v3 — slot claims
// -----------------------------------------------------------------------

// One record per (organization, volunteer or opportunity, date). Every
// guarded shift insert rewrites both of its claims, so two inserts that
// could invalidate each other's checks write the same keys and cannot
// both commit.
const SCHEMA_V3: &str = "\
DEFINE TABLE shift_slot SCHEMAFULL;
DEFINE FIELD claimed_at ON TABLE shift_slot TYPE datetime;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies,
/// in order, every migration newer than the recorded version. Returns
/// the schema version the database is at afterwards.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let from = current_version(db).await?;
    let mut version = from;

    for migration in MIGRATIONS.iter().filter(|m| m.version > from) {
        apply(db, migration).await?;
        version = migration.version;
    }

    Ok(version)
}

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!("could not record v{}: {e}", migration.version))
        })?;

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

/// Highest schema version this build knows how to apply.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn shifts_cannot_be_deleted() {
        assert!(SCHEMA_V1.contains("FOR delete NONE"));
    }

    #[test]
    fn latest_version_matches_last_migration() {
        assert_eq!(latest_version(), 3);
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
