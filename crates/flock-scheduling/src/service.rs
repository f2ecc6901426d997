//! Scheduling service: shift creation, updates, status changes,
//! availability and rosters.

use chrono::{NaiveDate, NaiveTime, Utc};
use flock_core::error::{FlockError, FlockResult};
use flock_core::models::availability::{
    AvailabilityKind, CreateAvailability, UpdateAvailability, VolunteerAvailability,
};
use flock_core::models::opportunity::ServingOpportunity;
use flock_core::models::shift::{
    CreateShift, ShiftStatus, TimeRange, UpdateShift, VolunteerShift,
};
use flock_core::models::volunteer::Volunteer;
use flock_core::repository::{
    AvailabilityRepository, OpportunityRepository, ShiftRepository, VolunteerRepository,
};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::ScheduleError;
use crate::locks::{KeyedLocks, LockKey};
use crate::rules::{self, AvailabilityWindow, OrgContext, SchedulingSnapshot, ShiftRequest};

/// Editable fields of an existing shift. Status has its own operations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShiftChanges {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location_id: Option<Option<Uuid>>,
    pub notes: Option<Option<String>>,
}

/// A new availability entry for a volunteer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAvailability {
    pub kind: AvailabilityKind,
    #[serde(default)]
    pub day_of_week: Option<u8>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub is_available: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Scheduling service.
///
/// Generic over repository implementations so that the scheduling layer
/// has no dependency on the database crate. Share one instance (behind
/// an `Arc`) between all callers: the keyed locks that serialise
/// conflicting requests live inside it.
pub struct SchedulingService<V, O, S, A> {
    volunteers: V,
    opportunities: O,
    shifts: S,
    availability: A,
    config: SchedulingConfig,
    locks: KeyedLocks,
}

impl<V, O, S, A> SchedulingService<V, O, S, A>
where
    V: VolunteerRepository,
    O: OpportunityRepository,
    S: ShiftRepository,
    A: AvailabilityRepository,
{
    pub fn new(
        volunteers: V,
        opportunities: O,
        shifts: S,
        availability: A,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            volunteers,
            opportunities,
            shifts,
            availability,
            config,
            locks: KeyedLocks::default(),
        }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    // -------------------------------------------------------------------
    // Shifts
    // -------------------------------------------------------------------

    /// Validate and create a shift.
    ///
    /// Runs every scheduling rule against a snapshot read while the
    /// volunteer's and the opportunity's day are locked, then hands the
    /// shift to the store, which re-checks overlap and capacity in the same
    /// transaction as the insert. `transaction_timeout_ms` bounds the
    /// locking and the reads; an insert that has started is never
    /// abandoned, so a caller told `TIMEOUT` has nothing stored. A store
    /// transaction that loses a race with another process is re-run while
    /// the deadline allows; nothing else is retried.
    pub async fn schedule_shift(
        &self,
        ctx: &OrgContext,
        request: ShiftRequest,
    ) -> Result<VolunteerShift, ScheduleError> {
        let volunteer_id = request.volunteer_id;
        let opportunity_id = request.opportunity_id;
        let shift_date = request.shift_date;
        let keys = vec![
            LockKey::Volunteer(volunteer_id, shift_date),
            LockKey::Opportunity(opportunity_id, shift_date),
        ];
        let deadline = Instant::now() + self.config.transaction_timeout();

        let result = async {
            let (_locks, volunteers_needed) = self
                .before(deadline, async {
                    let locks = self.locks.acquire(keys).await;
                    let today = Utc::now().date_naive();
                    let snapshot = self.snapshot(ctx, &request).await?;
                    rules::evaluate(ctx, &request, &snapshot, &self.config, today)?;
                    let volunteers_needed = snapshot
                        .opportunity
                        .as_ref()
                        .map_or(0, |o| o.volunteers_needed);
                    Ok::<_, ScheduleError>((locks, volunteers_needed))
                })
                .await?;
            self.insert(request.into_create(ctx, volunteers_needed), deadline)
                .await
        }
        .await;

        match &result {
            Ok(shift) => info!(
                organization_id = %ctx.organization_id(),
                shift_id = %shift.id,
                %volunteer_id,
                %opportunity_id,
                %shift_date,
                "Shift scheduled"
            ),
            Err(err) => log_failure(ctx, "schedule_shift", err),
        }
        result
    }

    /// Run the guarded insert, re-running it after a lost write race
    /// until `deadline`.
    async fn insert(
        &self,
        input: CreateShift,
        deadline: Instant,
    ) -> Result<VolunteerShift, ScheduleError> {
        loop {
            match self.shifts.create(input.clone()).await {
                Err(FlockError::WriteConflict { .. }) if Instant::now() < deadline => {
                    warn!(
                        opportunity_id = %input.opportunity_id,
                        shift_date = %input.shift_date,
                        "Shift insert lost a write race, re-running"
                    );
                    tokio::task::yield_now().await;
                }
                Err(FlockError::WriteConflict { .. }) => return Err(ScheduleError::Timeout),
                other => return other.map_err(ScheduleError::from),
            }
        }
    }

    /// Change the time window, location or notes of a shift.
    ///
    /// A new time window is re-checked for range and overlap with the
    /// volunteer's other shifts that day before the versioned write.
    pub async fn update_shift(
        &self,
        ctx: &OrgContext,
        shift_id: Uuid,
        expected_version: u32,
        changes: ShiftChanges,
    ) -> Result<VolunteerShift, ScheduleError> {
        let org = ctx.organization_id();
        let current = self.shifts.get_by_id(org, shift_id).await?;

        let update = UpdateShift {
            start_time: changes.start_time,
            end_time: changes.end_time,
            location_id: changes.location_id,
            notes: changes.notes,
            ..Default::default()
        };

        let retimed = changes.start_time.is_some_and(|t| t != current.start_time)
            || changes.end_time.is_some_and(|t| t != current.end_time);

        let result = if retimed {
            let start = changes.start_time.unwrap_or(current.start_time);
            let end = changes.end_time.unwrap_or(current.end_time);
            let keys = vec![
                LockKey::Volunteer(current.volunteer_id, current.shift_date),
                LockKey::Opportunity(current.opportunity_id, current.shift_date),
            ];
            let deadline = Instant::now() + self.config.transaction_timeout();
            async {
                let _locks = self
                    .before(deadline, async {
                        let locks = self.locks.acquire(keys).await;
                        let range =
                            TimeRange::new(start, end).ok_or(ScheduleError::InvalidTimeRange)?;
                        if current.status.blocks_volunteer() {
                            let same_day = self
                                .shifts
                                .list_for_volunteer_on(
                                    org,
                                    current.volunteer_id,
                                    current.shift_date,
                                )
                                .await?;
                            if let Some(other) =
                                rules::find_conflict(&range, &same_day, Some(shift_id))
                            {
                                return Err(ScheduleError::TimeConflict {
                                    conflicting_shift_id: other.id,
                                });
                            }
                        }
                        Ok::<_, ScheduleError>(locks)
                    })
                    .await?;
                Ok::<_, ScheduleError>(
                    self.shifts
                        .update(org, shift_id, expected_version, update)
                        .await?,
                )
            }
            .await
        } else {
            self.shifts
                .update(org, shift_id, expected_version, update)
                .await
                .map_err(ScheduleError::from)
        };

        if let Err(err) = &result {
            log_failure(ctx, "update_shift", err);
        }
        result
    }

    pub async fn confirm_shift(
        &self,
        ctx: &OrgContext,
        shift_id: Uuid,
        expected_version: u32,
    ) -> Result<VolunteerShift, ScheduleError> {
        self.transition(ctx, shift_id, expected_version, ShiftStatus::Confirmed)
            .await
    }

    /// Cancel a shift. Shifts are never deleted; a cancelled shift stops
    /// blocking the volunteer and frees its slot.
    pub async fn cancel_shift(
        &self,
        ctx: &OrgContext,
        shift_id: Uuid,
        expected_version: u32,
    ) -> Result<VolunteerShift, ScheduleError> {
        self.transition(ctx, shift_id, expected_version, ShiftStatus::Cancelled)
            .await
    }

    pub async fn check_in(
        &self,
        ctx: &OrgContext,
        shift_id: Uuid,
        expected_version: u32,
    ) -> Result<VolunteerShift, ScheduleError> {
        self.transition(ctx, shift_id, expected_version, ShiftStatus::CheckedIn)
            .await
    }

    pub async fn mark_no_show(
        &self,
        ctx: &OrgContext,
        shift_id: Uuid,
        expected_version: u32,
    ) -> Result<VolunteerShift, ScheduleError> {
        self.transition(ctx, shift_id, expected_version, ShiftStatus::NoShow)
            .await
    }

    pub async fn complete_shift(
        &self,
        ctx: &OrgContext,
        shift_id: Uuid,
        expected_version: u32,
    ) -> Result<VolunteerShift, ScheduleError> {
        self.transition(ctx, shift_id, expected_version, ShiftStatus::Completed)
            .await
    }

    async fn transition(
        &self,
        ctx: &OrgContext,
        shift_id: Uuid,
        expected_version: u32,
        next: ShiftStatus,
    ) -> Result<VolunteerShift, ScheduleError> {
        let result = async {
            let org = ctx.organization_id();
            let current = self.shifts.get_by_id(org, shift_id).await?;

            // Judge the transition against the state the caller saw.
            if current.version != expected_version {
                return Err(FlockError::VersionConflict {
                    entity: "volunteer_shift".into(),
                    id: shift_id.to_string(),
                    expected: expected_version,
                }
                .into());
            }
            if !current.status.can_transition_to(next) {
                return Err(ScheduleError::InvalidStatusTransition {
                    from: current.status,
                    to: next,
                });
            }

            let checked_in_at = (next == ShiftStatus::CheckedIn).then(|| Some(Utc::now()));
            let update = UpdateShift {
                status: Some(next),
                checked_in_at,
                ..Default::default()
            };
            Ok::<_, ScheduleError>(
                self.shifts
                    .update(org, shift_id, expected_version, update)
                    .await?,
            )
        }
        .await;

        match &result {
            Ok(shift) => info!(
                organization_id = %ctx.organization_id(),
                %shift_id,
                status = shift.status.as_str(),
                version = shift.version,
                "Shift status changed"
            ),
            Err(err) => log_failure(ctx, "transition", err),
        }
        result
    }

    /// A volunteer's shifts on one date, earliest first.
    pub async fn volunteer_schedule(
        &self,
        ctx: &OrgContext,
        volunteer_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<VolunteerShift>, ScheduleError> {
        self.owned_volunteer(ctx, volunteer_id).await?;
        Ok(self
            .shifts
            .list_for_volunteer_on(ctx.organization_id(), volunteer_id, date)
            .await?)
    }

    /// Everyone scheduled for an opportunity on one date, earliest first.
    pub async fn opportunity_roster(
        &self,
        ctx: &OrgContext,
        opportunity_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<VolunteerShift>, ScheduleError> {
        self.owned_opportunity(ctx, opportunity_id).await?;
        Ok(self
            .shifts
            .list_for_opportunity_on(ctx.organization_id(), opportunity_id, date)
            .await?)
    }

    // -------------------------------------------------------------------
    // Availability
    // -------------------------------------------------------------------

    pub async fn add_availability(
        &self,
        ctx: &OrgContext,
        volunteer_id: Uuid,
        input: NewAvailability,
    ) -> Result<VolunteerAvailability, ScheduleError> {
        self.owned_volunteer(ctx, volunteer_id).await?;

        AvailabilityWindow {
            kind: input.kind,
            day_of_week: input.day_of_week,
            start_time: input.start_time,
            end_time: input.end_time,
            start_date: input.start_date,
            end_date: input.end_date,
        }
        .validate()?;

        let created = self
            .availability
            .create(CreateAvailability {
                organization_id: ctx.organization_id(),
                volunteer_id,
                kind: input.kind,
                day_of_week: input.day_of_week,
                start_time: input.start_time,
                end_time: input.end_time,
                start_date: input.start_date,
                end_date: input.end_date,
                is_available: input.is_available,
                reason: input.reason,
            })
            .await?;

        info!(
            organization_id = %ctx.organization_id(),
            %volunteer_id,
            availability_id = %created.id,
            kind = created.kind.as_str(),
            "Availability added"
        );
        Ok(created)
    }

    /// Apply `changes`, validating the merged record before writing.
    pub async fn update_availability(
        &self,
        ctx: &OrgContext,
        availability_id: Uuid,
        changes: UpdateAvailability,
    ) -> Result<VolunteerAvailability, ScheduleError> {
        let org = ctx.organization_id();
        let current = self.availability.get_by_id(org, availability_id).await?;

        let mut merged = AvailabilityWindow::from(&current);
        if let Some(day_of_week) = changes.day_of_week {
            merged.day_of_week = day_of_week;
        }
        if let Some(start_time) = changes.start_time {
            merged.start_time = start_time;
        }
        if let Some(end_time) = changes.end_time {
            merged.end_time = end_time;
        }
        if let Some(start_date) = changes.start_date {
            merged.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            merged.end_date = end_date;
        }
        merged.validate()?;

        Ok(self
            .availability
            .update(org, availability_id, changes)
            .await?)
    }

    pub async fn remove_availability(
        &self,
        ctx: &OrgContext,
        availability_id: Uuid,
    ) -> Result<(), ScheduleError> {
        self.availability
            .delete(ctx.organization_id(), availability_id)
            .await?;
        info!(
            organization_id = %ctx.organization_id(),
            %availability_id,
            "Availability removed"
        );
        Ok(())
    }

    pub async fn list_availability(
        &self,
        ctx: &OrgContext,
        volunteer_id: Uuid,
    ) -> Result<Vec<VolunteerAvailability>, ScheduleError> {
        self.owned_volunteer(ctx, volunteer_id).await?;
        Ok(self
            .availability
            .list_for_volunteer(ctx.organization_id(), volunteer_id)
            .await?)
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    /// Run the checking phase of a write, failing with `Timeout` once
    /// `deadline` passes. Writes themselves run outside this bound.
    async fn before<T>(
        &self,
        deadline: Instant,
        work: impl Future<Output = Result<T, ScheduleError>>,
    ) -> Result<T, ScheduleError> {
        tokio::time::timeout_at(deadline, work)
            .await
            .map_err(|_| ScheduleError::Timeout)?
    }

    async fn snapshot(
        &self,
        ctx: &OrgContext,
        request: &ShiftRequest,
    ) -> FlockResult<SchedulingSnapshot> {
        let org = ctx.organization_id();
        let volunteer = found(self.volunteers.get_by_id(org, request.volunteer_id).await)?;
        let opportunity = found(
            self.opportunities
                .get_by_id(org, request.opportunity_id)
                .await,
        )?;
        if volunteer.is_none() || opportunity.is_none() {
            return Ok(SchedulingSnapshot {
                volunteer,
                opportunity,
                ..Default::default()
            });
        }

        Ok(SchedulingSnapshot {
            volunteer,
            opportunity,
            volunteer_shifts: self
                .shifts
                .list_for_volunteer_on(org, request.volunteer_id, request.shift_date)
                .await?,
            availability: self
                .availability
                .list_for_volunteer(org, request.volunteer_id)
                .await?,
            opportunity_shifts: self
                .shifts
                .list_for_opportunity_on(org, request.opportunity_id, request.shift_date)
                .await?,
        })
    }

    async fn owned_volunteer(
        &self,
        ctx: &OrgContext,
        volunteer_id: Uuid,
    ) -> Result<Volunteer, ScheduleError> {
        found(
            self.volunteers
                .get_by_id(ctx.organization_id(), volunteer_id)
                .await,
        )?
        .ok_or(ScheduleError::VolunteerNotFound { id: volunteer_id })
    }

    async fn owned_opportunity(
        &self,
        ctx: &OrgContext,
        opportunity_id: Uuid,
    ) -> Result<ServingOpportunity, ScheduleError> {
        found(
            self.opportunities
                .get_by_id(ctx.organization_id(), opportunity_id)
                .await,
        )?
        .ok_or(ScheduleError::OpportunityNotFound { id: opportunity_id })
    }
}

/// Turn a not-found lookup into `None`, keeping every other error.
fn found<T>(result: FlockResult<T>) -> FlockResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(FlockError::NotFound { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}

fn log_failure(ctx: &OrgContext, operation: &str, err: &ScheduleError) {
    if err.is_rejection() {
        warn!(
            organization_id = %ctx.organization_id(),
            operation,
            code = err.code(),
            reason = %err,
            "Scheduling request rejected"
        );
    } else if matches!(
        err,
        ScheduleError::Store(FlockError::NotFound { .. } | FlockError::VersionConflict { .. })
    ) {
        warn!(
            organization_id = %ctx.organization_id(),
            operation,
            code = err.code(),
            "Scheduling request could not be applied"
        );
    } else {
        error!(
            organization_id = %ctx.organization_id(),
            operation,
            error = %err,
            "Scheduling request failed"
        );
    }
}
