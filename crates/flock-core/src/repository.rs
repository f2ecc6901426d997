//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Organization-scoped repositories
//! require an `organization_id` parameter to enforce tenant isolation; a
//! record belonging to another organization is reported as not found.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::FlockResult;
use crate::models::{
    availability::{CreateAvailability, UpdateAvailability, VolunteerAvailability},
    opportunity::{CreateOpportunity, ServingOpportunity, UpdateOpportunity},
    organization::{CreateOrganization, Organization, UpdateOrganization},
    shift::{CreateShift, UpdateShift, VolunteerShift},
    volunteer::{CreateVolunteer, UpdateVolunteer, Volunteer},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Organization (global scope)
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = FlockResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = FlockResult<Organization>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = FlockResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = FlockResult<Organization>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = FlockResult<PaginatedResult<Organization>>> + Send;
}

// ---------------------------------------------------------------------------
// Organization-scoped repositories
// ---------------------------------------------------------------------------

pub trait VolunteerRepository: Send + Sync {
    fn create(&self, input: CreateVolunteer)
    -> impl Future<Output = FlockResult<Volunteer>> + Send;
    fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = FlockResult<Volunteer>> + Send;
    fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateVolunteer,
    ) -> impl Future<Output = FlockResult<Volunteer>> + Send;
    fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = FlockResult<PaginatedResult<Volunteer>>> + Send;
}

pub trait OpportunityRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOpportunity,
    ) -> impl Future<Output = FlockResult<ServingOpportunity>> + Send;
    fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = FlockResult<ServingOpportunity>> + Send;
    fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateOpportunity,
    ) -> impl Future<Output = FlockResult<ServingOpportunity>> + Send;
    fn list(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = FlockResult<PaginatedResult<ServingOpportunity>>> + Send;
}

pub trait ShiftRepository: Send + Sync {
    /// Insert a shift at version 1 with status `Scheduled`, in one
    /// transaction with the overlap and capacity re-check described on
    /// [`CreateShift`]. Refusals come back as `SlotTaken`; a transaction
    /// that lost a race with a concurrent writer comes back as
    /// `WriteConflict` and wrote nothing.
    fn create(&self, input: CreateShift) -> impl Future<Output = FlockResult<VolunteerShift>> + Send;
    fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = FlockResult<VolunteerShift>> + Send;
    /// All shifts (any status) of a volunteer on one date, ordered by start.
    fn list_for_volunteer_on(
        &self,
        organization_id: Uuid,
        volunteer_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = FlockResult<Vec<VolunteerShift>>> + Send;
    /// All shifts (any status) of an opportunity on one date, ordered by start.
    fn list_for_opportunity_on(
        &self,
        organization_id: Uuid,
        opportunity_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = FlockResult<Vec<VolunteerShift>>> + Send;
    /// Apply `input` only if the stored version equals `expected_version`,
    /// incrementing it by one. Returns `VersionConflict` when the record
    /// exists at another version and `NotFound` when it does not exist.
    fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        expected_version: u32,
        input: UpdateShift,
    ) -> impl Future<Output = FlockResult<VolunteerShift>> + Send;
}

pub trait AvailabilityRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAvailability,
    ) -> impl Future<Output = FlockResult<VolunteerAvailability>> + Send;
    fn get_by_id(
        &self,
        organization_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = FlockResult<VolunteerAvailability>> + Send;
    fn update(
        &self,
        organization_id: Uuid,
        id: Uuid,
        input: UpdateAvailability,
    ) -> impl Future<Output = FlockResult<VolunteerAvailability>> + Send;
    fn delete(&self, organization_id: Uuid, id: Uuid)
    -> impl Future<Output = FlockResult<()>> + Send;
    fn list_for_volunteer(
        &self,
        organization_id: Uuid,
        volunteer_id: Uuid,
    ) -> impl Future<Output = FlockResult<Vec<VolunteerAvailability>>> + Send;
}
