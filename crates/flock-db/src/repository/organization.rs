//! Organizations in SurrealDB.
//!
//! Organizations are the tenant boundary, so this is the only repository
//! whose queries are not filtered by `organization_id`. The HTTP layer
//! resolves every tenant header through [`OrganizationRepository::get_by_id`].

use chrono::{DateTime, Utc};
use flock_core::error::FlockResult;
use flock_core::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use flock_core::repository::{OrganizationRepository, PaginatedResult, Pagination};
use serde_json::{Map, Value};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, count_from, first_row, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "organization";

/// Every read projects the record key next to the stored columns.
const PROJECTION: &str = "meta::id(id) AS record_id, name, slug, metadata, created_at, updated_at";

#[derive(Debug, SurrealValue)]
struct StoredOrganization {
    record_id: String,
    name: String,
    slug: String,
    metadata: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoredOrganization> for Organization {
    type Error = DbError;

    fn try_from(row: StoredOrganization) -> Result<Self, DbError> {
        Ok(Organization {
            id: parse_uuid(&row.record_id, "organization")?,
            name: row.name,
            slug: row.slug,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Slugs are compared case-insensitively and never carry whitespace.
fn normalize_slug(slug: &str) -> String {
    slug.trim().to_ascii_lowercase()
}

#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> FlockResult<Organization> {
        let mut response = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM type::record('organization', $id)"
            ))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StoredOrganization> = response.take(0).map_err(DbError::from)?;
        Ok(Organization::try_from(first_row(rows, ENTITY, id.to_string())?)?)
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> FlockResult<Organization> {
        let id = Uuid::new_v4();
        self.db
            .query(
                "CREATE type::record('organization', $id) \
                 CONTENT { name: $name, slug: $slug, metadata: $metadata }",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("slug", normalize_slug(&input.slug)))
            .bind((
                "metadata",
                input.metadata.unwrap_or_else(|| Value::Object(Map::new())),
            ))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        self.fetch(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> FlockResult<Organization> {
        self.fetch(id).await
    }

    async fn get_by_slug(&self, slug: &str) -> FlockResult<Organization> {
        let slug = normalize_slug(slug);
        let mut response = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM organization WHERE slug = $slug LIMIT 1"
            ))
            .bind(("slug", slug.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StoredOrganization> = response.take(0).map_err(DbError::from)?;
        Ok(Organization::try_from(first_row(
            rows,
            ENTITY,
            format!("slug={slug}"),
        )?)?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> FlockResult<Organization> {
        // Unset fields bind as NONE and keep the stored value.
        let mut response = self
            .db
            .query(
                "UPDATE type::record('organization', $id) SET \
                 name = $name ?? name, \
                 slug = $slug ?? slug, \
                 metadata = $metadata ?? metadata, \
                 updated_at = time::now() \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug.as_deref().map(normalize_slug)))
            .bind(("metadata", input.metadata))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(ENTITY, e))?;

        let touched: Vec<Value> = response.take(0).map_err(DbError::from)?;
        if touched.is_empty() {
            return Err(DbError::NotFound {
                entity: ENTITY.into(),
                id: id.to_string(),
            }
            .into());
        }
        self.fetch(id).await
    }

    async fn list(&self, pagination: Pagination) -> FlockResult<PaginatedResult<Organization>> {
        let mut response = self
            .db
            .query(format!(
                "SELECT count() AS total FROM organization GROUP ALL; \
                 SELECT {PROJECTION} FROM organization ORDER BY slug ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let totals: Vec<CountRow> = response.take(0).map_err(DbError::from)?;
        let rows: Vec<StoredOrganization> = response.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(Organization::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginatedResult {
            items,
            total: count_from(totals),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
