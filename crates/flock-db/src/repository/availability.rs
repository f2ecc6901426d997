//! SurrealDB implementation of [`AvailabilityRepository`].

use chrono::{DateTime, Utc};
use flock_core::error::FlockResult;
use flock_core::models::availability::{
    AvailabilityKind, CreateAvailability, UpdateAvailability, VolunteerAvailability,
};
use flock_core::repository::AvailabilityRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{
    first_row, format_date, format_time, parse_opt_date, parse_opt_time, parse_uuid, resolve_id,
};
use crate::error::DbError;

const ENTITY: &str = "volunteer_availability";

#[derive(Debug, SurrealValue)]
struct AvailabilityRow {
    record_id: Option<String>,
    organization_id: String,
    volunteer_id: String,
    kind: String,
    day_of_week: Option<i64>,
    start_time: Option<String>,
    end_time: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    is_available: bool,
    reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AvailabilityRow {
    fn into_availability(self, id: Option<Uuid>) -> Result<VolunteerAvailability, DbError> {
        let kind = AvailabilityKind::parse(&self.kind)
            .ok_or_else(|| DbError::Decode(format!("unknown availability kind: {}", self.kind)))?;
        let day_of_week = self
            .day_of_week
            .map(|d| {
                u8::try_from(d).map_err(|_| DbError::Decode(format!("invalid day of week: {d}")))
            })
            .transpose()?;
        Ok(VolunteerAvailability {
            id: resolve_id(id, self.record_id.as_deref())?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            volunteer_id: parse_uuid(&self.volunteer_id, "volunteer")?,
            kind,
            day_of_week,
            start_time: parse_opt_time(self.start_time, "start")?,
            end_time: parse_opt_time(self.end_time, "end")?,
            start_date: parse_opt_date(self.start_date, "start")?,
            end_date: parse_opt_date(self.end_date, "end")?,
            is_available: self.is_available,
            reason: self.reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the volunteer availability repository.
#[derive(Clone)]
pub struct SurrealAvailabilityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAvailabilityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AvailabilityRepository for SurrealAvailabilityRepository<C> {
    async fn create(&self, input: CreateAvailability) -> FlockResult<VolunteerAvailability> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('volunteer_availability', $id) SET \
                 organization_id = $organization_id, \
                 volunteer_id = $volunteer_id, kind = $kind, \
                 day_of_week = $day_of_week, \
                 start_time = $start_time, end_time = $end_time, \
                 start_date = $start_date, end_date = $end_date, \
                 is_available = $is_available, reason = $reason",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("volunteer_id", input.volunteer_id.to_string()))
            .bind(("kind", input.kind.as_str().to_string()))
            .bind(("day_of_week", input.day_of_week.map(i64::from)))
            .bind(("start_time", input.start_time.map(format_time)))
            .bind(("end_time", input.end_time.map(format_time)))
            .bind(("start_date", input.start_date.map(format_date)))
            .bind(("end_date", input.end_date.map(format_date)))
            .bind(("is_available", input.is_available))
            .bind(("reason", input.reason))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let rows: Vec<AvailabilityRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_availability(Some(id))?)
    }

    async fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> FlockResult<VolunteerAvailability> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('volunteer_availability', $id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AvailabilityRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_availability(Some(id))?)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateAvailability,
    ) -> FlockResult<VolunteerAvailability> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.day_of_week.is_some() {
            sets.push("day_of_week = $day_of_week");
        }
        if input.start_time.is_some() {
            sets.push("start_time = $start_time");
        }
        if input.end_time.is_some() {
            sets.push("end_time = $end_time");
        }
        if input.start_date.is_some() {
            sets.push("start_date = $start_date");
        }
        if input.end_date.is_some() {
            sets.push("end_date = $end_date");
        }
        if input.is_available.is_some() {
            sets.push("is_available = $is_available");
        }
        if input.reason.is_some() {
            sets.push("reason = $reason");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('volunteer_availability', $id) SET {} \
             WHERE organization_id = $organization_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()));

        if let Some(day_of_week) = input.day_of_week {
            builder = builder.bind(("day_of_week", day_of_week.map(i64::from)));
        }
        if let Some(start_time) = input.start_time {
            builder = builder.bind(("start_time", start_time.map(format_time)));
        }
        if let Some(end_time) = input.end_time {
            builder = builder.bind(("end_time", end_time.map(format_time)));
        }
        if let Some(start_date) = input.start_date {
            builder = builder.bind(("start_date", start_date.map(format_date)));
        }
        if let Some(end_date) = input.end_date {
            builder = builder.bind(("end_date", end_date.map(format_date)));
        }
        if let Some(is_available) = input.is_available {
            builder = builder.bind(("is_available", is_available));
        }
        if let Some(reason) = input.reason {
            builder = builder.bind(("reason", reason));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let rows: Vec<AvailabilityRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_availability(Some(id))?)
    }

    async fn delete(&self, organization_id: Uuid, id: Uuid) -> FlockResult<()> {
        // Scoped lookup first so deleting another organization's record
        // reports not-found instead of silently succeeding.
        self.get_by_id(organization_id, id).await?;

        self.db
            .query(
                "DELETE type::record('volunteer_availability', $id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("id", id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        Ok(())
    }

    async fn list_for_volunteer(
        &self,
        organization_id: Uuid,
        volunteer_id: Uuid,
    ) -> FlockResult<Vec<VolunteerAvailability>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM volunteer_availability \
                 WHERE organization_id = $organization_id \
                 AND volunteer_id = $volunteer_id \
                 ORDER BY created_at ASC",
            )
            .bind(("organization_id", organization_id.to_string()))
            .bind(("volunteer_id", volunteer_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AvailabilityRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_availability(None))
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
