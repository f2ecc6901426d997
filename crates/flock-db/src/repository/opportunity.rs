//! SurrealDB implementation of [`OpportunityRepository`].

use chrono::{DateTime, Utc};
use flock_core::error::FlockResult;
use flock_core::models::opportunity::{CreateOpportunity, ServingOpportunity, UpdateOpportunity};
use flock_core::repository::{OpportunityRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, count_from, first_row, parse_uuid, resolve_id};
use crate::error::DbError;

const ENTITY: &str = "serving_opportunity";

#[derive(Debug, SurrealValue)]
struct OpportunityRow {
    record_id: Option<String>,
    organization_id: String,
    name: String,
    category: Option<String>,
    required_skills: Vec<String>,
    volunteers_needed: u32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OpportunityRow {
    fn into_opportunity(self, id: Option<Uuid>) -> Result<ServingOpportunity, DbError> {
        Ok(ServingOpportunity {
            id: resolve_id(id, self.record_id.as_deref())?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            name: self.name,
            category: self.category,
            required_skills: self.required_skills,
            volunteers_needed: self.volunteers_needed,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the serving opportunity repository.
#[derive(Clone)]
pub struct SurrealOpportunityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOpportunityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OpportunityRepository for SurrealOpportunityRepository<C> {
    async fn create(&self, input: CreateOpportunity) -> FlockResult<ServingOpportunity> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('serving_opportunity', $id) SET \
                 organization_id = $organization_id, \
                 name = $name, category = $category, \
                 required_skills = $required_skills, \
                 volunteers_needed = $volunteers_needed, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("name", input.name))
            .bind(("category", input.category))
            .bind(("required_skills", input.required_skills))
            .bind(("volunteers_needed", input.volunteers_needed))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let rows: Vec<OpportunityRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_opportunity(Some(id))?)
    }

    async fn get_by_id(&self, organization_id: Uuid, id: Uuid) -> FlockResult<ServingOpportunity> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('serving_opportunity', $id) \
                 WHERE organization_id = $organization_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OpportunityRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_opportunity(Some(id))?)
    }

    async fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateOpportunity,
    ) -> FlockResult<ServingOpportunity> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.category.is_some() {
            sets.push("category = $category");
        }
        if input.required_skills.is_some() {
            sets.push("required_skills = $required_skills");
        }
        if input.volunteers_needed.is_some() {
            sets.push("volunteers_needed = $volunteers_needed");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('serving_opportunity', $id) SET {} \
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
        if let Some(category) = input.category {
            builder = builder.bind(("category", category));
        }
        if let Some(required_skills) = input.required_skills {
            builder = builder.bind(("required_skills", required_skills));
        }
        if let Some(volunteers_needed) = input.volunteers_needed {
            builder = builder.bind(("volunteers_needed", volunteers_needed));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let rows: Vec<OpportunityRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, ENTITY, id_str)?.into_opportunity(Some(id))?)
    }

    async fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> FlockResult<PaginatedResult<ServingOpportunity>> {
        let org_id_str = organization_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM serving_opportunity \
                 WHERE organization_id = $organization_id GROUP ALL",
            )
            .bind(("organization_id", org_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM serving_opportunity \
                 WHERE organization_id = $organization_id \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organization_id", org_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OpportunityRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.into_opportunity(None))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: count_from(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
