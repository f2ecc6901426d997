//! SurrealDB implementation of [`VolunteerRepository`].

use chrono::{DateTime, Utc};
use flock_core::error::FlockResult;
use flock_core::models::volunteer::{
    BackgroundCheckStatus, CreateVolunteer, UpdateVolunteer, Volunteer,
};
use flock_core::repository::{PaginatedResult, Pagination, VolunteerRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, count_from, first_row, format_date, parse_opt_date, parse_uuid, resolve_id};
use crate::error::DbError;

const ENTITY: &str = "volunteer";

#[derive(Debug, SurrealValue)]
struct VolunteerRow {
    record_id: Option<String>,
    organization_id: String,
    name: String,
    email: Option<String>,
    skills: Vec<String>,
    background_check_status: String,
    background_check_expires_on: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VolunteerRow {
    fn into_volunteer(self, id: Option<Uuid>) -> Result<Volunteer, DbError> {
        let status = BackgroundCheckStatus::parse(&self.background_check_status).ok_or_else(|| {
            DbError::Decode(format!(
                "unknown background check status: {}",
                self.background_check_status
            ))
        })?;
        Ok(Volunteer {
            id: resolve_id(id, self.record_id.as_deref())?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            name: self.name,
            email: self.email,
            skills: self.skills,
            background_check_status: status,
            background_check_expires_on: parse_opt_date(
                self.background_check_expires_on,
                "background check expiry",
            )?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Volunteer repository.
#[derive(Clone)]
pub struct SurrealVolunteerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealVolunteerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> VolunteerRepository for SurrealVolunteerRepository<C> {
    async fn create(&self, input: CreateVolunteer) -> FlockResult<Volunteer> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('volunteer', $id) SET \
                 organization_id = $organization_id, \
                 name = $name, email = $email, skills = $skills, \
                 background_check_status = $background_check_status, \
                 background_check_expires_on = $background_check_expires_on, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("skills", input.skills))
            .bind((
                "background_check_status",
                input.background_check_status.as_str().to_string(),
            ))
            .bind((
                "background_check_expires_on",
                input.background_check_expires_on.map(format_date),
            ))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let rows: Vec<VolunteerRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_volunteer(Some(id))?)
    }

    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> FlockResult<Volunteer> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('volunteer', $id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VolunteerRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_volunteer(Some(id))?)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateVolunteer,
    ) -> FlockResult<Volunteer> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.skills.is_some() {
            sets.push("skills = $skills");
        }
        if input.background_check_status.is_some() {
            sets.push("background_check_status = $background_check_status");
        }
        if input.background_check_expires_on.is_some() {
            sets.push("background_check_expires_on = $background_check_expires_on");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('volunteer', $id) SET {} \
             WHERE organization_id = $organization_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(skills) = input.skills {
            builder = builder.bind(("skills", skills));
        }
        if let Some(status) = input.background_check_status {
            builder = builder.bind(("background_check_status", status.as_str().to_string()));
        }
        if let Some(expires_on) = input.background_check_expires_on {
            builder = builder.bind(("background_check_expires_on", expires_on.map(format_date)));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let rows: Vec<VolunteerRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_volunteer(Some(id))?)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> FlockResult<PaginatedResult<Volunteer>> {
        let org_id_str = organization_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM volunteer \
                 WHERE organization_id = $organization_id GROUP ALL",
            )
            .bind(("organization_id", org_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM volunteer \
                 WHERE organization_id = $organization_id \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organization_id", org_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<VolunteerRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.into_volunteer(None))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: count_from(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
