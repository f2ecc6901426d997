//! SurrealDB implementation of [`ShiftRepository`].
//!
//! Inserts run as one transaction that re-checks the volunteer's time and
//! the opportunity's capacity before writing (`GUARDED_INSERT`).
//! Updates are optimistic: the `UPDATE` carries `version = $expected` in
//! its predicate and bumps the counter in the same statement, so a stale
//! caller matches zero rows. The record is then re-read to tell a stale
//! write apart from a missing shift.

use chrono::{DateTime, NaiveDate, Utc};
use flock_core::error::{FlockError, FlockResult};
use flock_core::models::shift::{CreateShift, ShiftStatus, UpdateShift, VolunteerShift};
use flock_core::repository::ShiftRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;

use super::{
    first_row, format_date, format_time, parse_date, parse_opt_uuid, parse_time, parse_uuid,
    resolve_id,
};
use crate::error::DbError;

const ENTITY: &str = "volunteer_shift";

/// Claim the volunteer's and the opportunity's day, re-check overlap and
/// capacity, then insert, all in one transaction. The claims make two
/// racing inserts write the same records, so the store refuses to commit
/// the second one.
const GUARDED_INSERT: &str = "\
BEGIN TRANSACTION;
UPSERT type::record('shift_slot', [$organization_id, 'volunteer', $volunteer_id, $shift_date]) \
    SET claimed_at = time::now();
UPSERT type::record('shift_slot', [$organization_id, 'opportunity', $opportunity_id, $shift_date]) \
    SET claimed_at = time::now();
LET $busy = (SELECT VALUE meta::id(id) FROM volunteer_shift \
    WHERE organization_id = $organization_id AND volunteer_id = $volunteer_id \
    AND shift_date = $shift_date AND status != 'Cancelled' \
    AND start_time < $end_time AND end_time > $start_time);
IF array::len($busy) > 0 { THROW string::concat('VOLUNTEER_BUSY:', <string> $busy[0]); };
LET $taken = (SELECT VALUE meta::id(id) FROM volunteer_shift \
    WHERE organization_id = $organization_id AND opportunity_id = $opportunity_id \
    AND shift_date = $shift_date AND status NOT IN ['Cancelled', 'NoShow']);
IF array::len($taken) >= $volunteers_needed { THROW 'OPPORTUNITY_FULL'; };
CREATE type::record('volunteer_shift', $id) SET \
    organization_id = $organization_id, \
    volunteer_id = $volunteer_id, \
    opportunity_id = $opportunity_id, \
    location_id = $location_id, \
    shift_date = $shift_date, \
    start_time = $start_time, end_time = $end_time, \
    status = 'Scheduled', notes = $notes, \
    checked_in_at = NONE, version = 1;
COMMIT TRANSACTION;";

#[derive(Debug, SurrealValue)]
struct ShiftRow {
    record_id: Option<String>,
    organization_id: String,
    volunteer_id: String,
    opportunity_id: String,
    location_id: Option<String>,
    shift_date: String,
    start_time: String,
    end_time: String,
    status: String,
    notes: Option<String>,
    checked_in_at: Option<DateTime<Utc>>,
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShiftRow {
    fn into_shift(self, id: Option<Uuid>) -> Result<VolunteerShift, DbError> {
        let status = ShiftStatus::parse(&self.status)
            .ok_or_else(|| DbError::Decode(format!("unknown shift status: {}", self.status)))?;
        Ok(VolunteerShift {
            id: resolve_id(id, self.record_id.as_deref())?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            volunteer_id: parse_uuid(&self.volunteer_id, "volunteer")?,
            opportunity_id: parse_uuid(&self.opportunity_id, "opportunity")?,
            location_id: parse_opt_uuid(self.location_id, "location")?,
            shift_date: parse_date(&self.shift_date, "shift")?,
            start_time: parse_time(&self.start_time, "start")?,
            end_time: parse_time(&self.end_time, "end")?,
            status,
            notes: self.notes,
            checked_in_at: self.checked_in_at,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn rows_into_shifts(rows: Vec<ShiftRow>) -> Result<Vec<VolunteerShift>, DbError> {
    rows.into_iter().map(|row| row.into_shift(None)).collect()
}

/// SurrealDB implementation of the volunteer shift repository.
#[derive(Clone)]
pub struct SurrealShiftRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealShiftRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn list_where(
        &self,
        organization_id: Uuid,
        column: &'static str,
        value: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<VolunteerShift>, DbError> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM volunteer_shift \
             WHERE organization_id = $organization_id \
             AND {column} = $value AND shift_date = $shift_date \
             ORDER BY start_time ASC"
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("organization_id", organization_id.to_string()))
            .bind(("value", value.to_string()))
            .bind(("shift_date", format_date(date)))
            .await?;

        let rows: Vec<ShiftRow> = result.take(0)?;
        rows_into_shifts(rows)
    }
}

impl<C: Connection> ShiftRepository for SurrealShiftRepository<C> {
    async fn create(&self, input: CreateShift) -> FlockResult<VolunteerShift> {
        let id = Uuid::new_v4();
        let organization_id = input.organization_id;
        let volunteers_needed = input.volunteers_needed;

        let mut response = self
            .db
            .query(GUARDED_INSERT)
            .bind(("id", id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("volunteer_id", input.volunteer_id.to_string()))
            .bind(("opportunity_id", input.opportunity_id.to_string()))
            .bind(("location_id", input.location_id.map(|l| l.to_string())))
            .bind(("shift_date", format_date(input.shift_date)))
            .bind(("start_time", format_time(input.start_time)))
            .bind(("end_time", format_time(input.end_time)))
            .bind(("notes", input.notes))
            .bind(("volunteers_needed", volunteers_needed))
            .await
            .map_err(DbError::from)?;

        let errors = response.take_errors();
        if !errors.is_empty() {
            return Err(
                DbError::from_guarded_insert(ENTITY, volunteers_needed, errors.into_values())
                    .into(),
            );
        }

        self.get_by_id(organization_id, id).await
    }

    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> FlockResult<VolunteerShift> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('volunteer_shift', $id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ShiftRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_shift(Some(id))?)
    }

    async fn list_for_volunteer_on(
        &self,
        organization_id: Uuid,
        volunteer_id: Uuid,
        date: NaiveDate,
    ) -> FlockResult<Vec<VolunteerShift>> {
        Ok(self
            .list_where(organization_id, "volunteer_id", volunteer_id, date)
            .await?)
    }

    async fn list_for_opportunity_on(
        &self,
        organization_id: Uuid,
        opportunity_id: Uuid,
        date: NaiveDate,
    ) -> FlockResult<Vec<VolunteerShift>> {
        Ok(self
            .list_where(organization_id, "opportunity_id", opportunity_id, date)
            .await?)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        expected_version: u32,
        input: UpdateShift,
    ) -> FlockResult<VolunteerShift> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.start_time.is_some() {
            sets.push("start_time = $start_time");
        }
        if input.end_time.is_some() {
            sets.push("end_time = $end_time");
        }
        if input.location_id.is_some() {
            sets.push("location_id = $location_id");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.checked_in_at.is_some() {
            sets.push("checked_in_at = $checked_in_at");
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('volunteer_shift', $id) SET {} \
             WHERE organization_id = $organization_id \
             AND version = $expected_version",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()))
            .bind(("expected_version", expected_version));

        if let Some(start_time) = input.start_time {
            builder = builder.bind(("start_time", format_time(start_time)));
        }
        if let Some(end_time) = input.end_time {
            builder = builder.bind(("end_time", format_time(end_time)));
        }
        if let Some(location_id) = input.location_id {
            builder = builder.bind(("location_id", location_id.map(|l| l.to_string())));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }
        if let Some(checked_in_at) = input.checked_in_at {
            builder = builder.bind(("checked_in_at", checked_in_at));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let rows: Vec<ShiftRow> = result.take(0).map_err(DbError::from)?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(row.into_shift(Some(id))?);
        }

        // Zero rows matched: either the shift is gone or someone else wrote first.
        let current = self.get_by_id(organization_id, id).await?;
        warn!(
            shift_id = %id,
            expected_version,
            current_version = current.version,
            "Rejected stale shift update"
        );
        Err(FlockError::VersionConflict {
            entity: ENTITY.into(),
            id: id_str,
            expected: expected_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{THROW_OPPORTUNITY_FULL, THROW_VOLUNTEER_BUSY};

    #[test]
    fn guarded_insert_throws_the_markers_it_is_decoded_with() {
        assert!(GUARDED_INSERT.contains(&format!("'{THROW_OPPORTUNITY_FULL}'")));
        assert!(GUARDED_INSERT.contains(&format!("'{THROW_VOLUNTEER_BUSY}'")));
        assert!(GUARDED_INSERT.starts_with("BEGIN TRANSACTION;"));
        assert!(GUARDED_INSERT.ends_with("COMMIT TRANSACTION;"));
    }
}
