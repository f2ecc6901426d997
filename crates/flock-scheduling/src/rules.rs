//! Scheduling rules.
//!
//! Everything here is pure: the service loads a [`SchedulingSnapshot`]
//! while holding its locks and hands it to [`evaluate`], which either
//! accepts the request or names the first rule it breaks.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use flock_core::models::availability::{AvailabilityKind, VolunteerAvailability};
use flock_core::models::opportunity::ServingOpportunity;
use flock_core::models::shift::{CreateShift, TimeRange, VolunteerShift};
use flock_core::models::volunteer::{BackgroundCheckStatus, Volunteer};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::SchedulingConfig;
use crate::error::ScheduleError;

/// The organization a request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrgContext {
    organization_id: Uuid,
}

impl OrgContext {
    pub fn new(organization_id: Uuid) -> Self {
        Self { organization_id }
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization_id
    }
}

/// A request to put a volunteer on a serving opportunity.
#[derive(Debug, Clone, Deserialize)]
pub struct ShiftRequest {
    pub volunteer_id: Uuid,
    pub opportunity_id: Uuid,
    #[serde(default)]
    pub location_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ShiftRequest {
    pub(crate) fn into_create(self, ctx: &OrgContext, volunteers_needed: u32) -> CreateShift {
        CreateShift {
            organization_id: ctx.organization_id(),
            volunteer_id: self.volunteer_id,
            opportunity_id: self.opportunity_id,
            location_id: self.location_id,
            shift_date: self.shift_date,
            start_time: self.start_time,
            end_time: self.end_time,
            notes: self.notes,
            volunteers_needed,
        }
    }
}

/// State read for one scheduling decision.
///
/// A missing volunteer or opportunity is `None`; the rules report it the
/// same way as one owned by another organization.
#[derive(Debug, Clone, Default)]
pub struct SchedulingSnapshot {
    pub volunteer: Option<Volunteer>,
    pub opportunity: Option<ServingOpportunity>,
    /// The volunteer's shifts on the requested date.
    pub volunteer_shifts: Vec<VolunteerShift>,
    pub availability: Vec<VolunteerAvailability>,
    /// The opportunity's shifts on the requested date.
    pub opportunity_shifts: Vec<VolunteerShift>,
}

/// Run every scheduling rule in order; the first failure wins.
pub fn evaluate(
    ctx: &OrgContext,
    request: &ShiftRequest,
    snapshot: &SchedulingSnapshot,
    config: &SchedulingConfig,
    today: NaiveDate,
) -> Result<(), ScheduleError> {
    let range = TimeRange::new(request.start_time, request.end_time)
        .ok_or(ScheduleError::InvalidTimeRange)?;

    let volunteer = snapshot
        .volunteer
        .as_ref()
        .filter(|v| v.organization_id == ctx.organization_id())
        .ok_or(ScheduleError::VolunteerNotFound {
            id: request.volunteer_id,
        })?;
    let opportunity = snapshot
        .opportunity
        .as_ref()
        .filter(|o| o.organization_id == ctx.organization_id())
        .ok_or(ScheduleError::OpportunityNotFound {
            id: request.opportunity_id,
        })?;

    if let Some(existing) = find_conflict(&range, &snapshot.volunteer_shifts, None) {
        return Err(ScheduleError::TimeConflict {
            conflicting_shift_id: existing.id,
        });
    }

    if snapshot
        .availability
        .iter()
        .any(|a| a.blacks_out(request.shift_date))
    {
        return Err(ScheduleError::VolunteerUnavailable);
    }

    if requires_background_check(
        opportunity.category.as_deref(),
        &config.sensitive_category_keywords,
    ) {
        check_background(volunteer, today)?;
    }

    let missing = missing_skills(&opportunity.required_skills, &volunteer.skills);
    if !missing.is_empty() {
        return Err(ScheduleError::MissingRequiredSkills { missing });
    }

    let filled = snapshot
        .opportunity_shifts
        .iter()
        .filter(|s| s.status.counts_toward_capacity())
        .count();
    if filled >= opportunity.volunteers_needed as usize {
        return Err(ScheduleError::OpportunityFull {
            volunteers_needed: opportunity.volunteers_needed,
        });
    }

    Ok(())
}

/// First non-cancelled shift overlapping `range`, ignoring `exclude`.
pub fn find_conflict<'a>(
    range: &TimeRange,
    shifts: &'a [VolunteerShift],
    exclude: Option<Uuid>,
) -> Option<&'a VolunteerShift> {
    shifts.iter().find(|s| {
        Some(s.id) != exclude && s.status.blocks_volunteer() && s.time_range().overlaps(range)
    })
}

pub fn requires_background_check(category: Option<&str>, keywords: &[String]) -> bool {
    let Some(category) = category else {
        return false;
    };
    let category = category.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .any(|k| !k.is_empty() && category.contains(&k))
}

/// Background-check gate for sensitive roles.
///
/// Expiry is inclusive: a check that expires today still passes.
pub fn check_background(volunteer: &Volunteer, today: NaiveDate) -> Result<(), ScheduleError> {
    match volunteer.background_check_status {
        BackgroundCheckStatus::Expired => Err(ScheduleError::BackgroundCheckExpired),
        BackgroundCheckStatus::Cleared => match volunteer.background_check_expires_on {
            Some(expires_on) if expires_on < today => Err(ScheduleError::BackgroundCheckExpired),
            _ => Ok(()),
        },
        _ => Err(ScheduleError::BackgroundCheckRequired),
    }
}

/// Required skills the volunteer has not declared, compared trimmed and
/// case-insensitively. Returned in the order the opportunity lists them.
pub fn missing_skills(required: &[String], declared: &[String]) -> Vec<String> {
    let declared: HashSet<String> = declared.iter().map(|s| normalize_skill(s)).collect();
    let mut seen = HashSet::new();
    required
        .iter()
        .filter_map(|skill| {
            let key = normalize_skill(skill);
            (!key.is_empty() && !declared.contains(&key) && seen.insert(key))
                .then(|| skill.trim().to_string())
        })
        .collect()
}

fn normalize_skill(skill: &str) -> String {
    skill.trim().to_lowercase()
}

/// The fields that decide whether an availability record is well formed.
#[derive(Debug, Clone)]
pub struct AvailabilityWindow {
    pub kind: AvailabilityKind,
    pub day_of_week: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl AvailabilityWindow {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let invalid = |msg: &str| Err(ScheduleError::InvalidAvailability(msg.into()));
        match self.kind {
            AvailabilityKind::Blackout => {
                let Some(start) = self.start_date else {
                    return invalid("blackout needs a start date");
                };
                if self.end_date.is_some_and(|end| end < start) {
                    return invalid("blackout ends before it starts");
                }
            }
            AvailabilityKind::Recurring => {
                match self.day_of_week {
                    Some(day) if day <= 6 => {}
                    Some(_) => return invalid("day of week must be 0 (Monday) to 6 (Sunday)"),
                    None => return invalid("recurring availability needs a day of week"),
                }
                match (self.start_time, self.end_time) {
                    (Some(start), Some(end)) if start < end => {}
                    (Some(_), Some(_)) => return invalid("window must start before it ends"),
                    _ => return invalid("recurring availability needs start and end times"),
                }
            }
        }
        Ok(())
    }
}

impl From<&VolunteerAvailability> for AvailabilityWindow {
    fn from(a: &VolunteerAvailability) -> Self {
        Self {
            kind: a.kind,
            day_of_week: a.day_of_week,
            start_time: a.start_time,
            end_time: a.end_time,
            start_date: a.start_date,
            end_date: a.end_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use flock_core::models::shift::ShiftStatus;

    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct Fixture {
        ctx: OrgContext,
        snapshot: SchedulingSnapshot,
        request: ShiftRequest,
    }

    fn fixture() -> Fixture {
        let org = Uuid::new_v4();
        let now = Utc::now();
        let volunteer = Volunteer {
            id: Uuid::new_v4(),
            organization_id: org,
            name: "Ruth".into(),
            email: None,
            skills: vec!["CPR".into()],
            background_check_status: BackgroundCheckStatus::Cleared,
            background_check_expires_on: Some(d(2030, 1, 1)),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let opportunity = ServingOpportunity {
            id: Uuid::new_v4(),
            organization_id: org,
            name: "Greeter".into(),
            category: Some("Hospitality".into()),
            required_skills: vec![],
            volunteers_needed: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let request = ShiftRequest {
            volunteer_id: volunteer.id,
            opportunity_id: opportunity.id,
            location_id: None,
            shift_date: d(2025, 6, 1),
            start_time: t(9, 30),
            end_time: t(10, 30),
            notes: None,
        };
        Fixture {
            ctx: OrgContext::new(org),
            snapshot: SchedulingSnapshot {
                volunteer: Some(volunteer),
                opportunity: Some(opportunity),
                ..Default::default()
            },
            request,
        }
    }

    fn shift(f: &Fixture, start: NaiveTime, end: NaiveTime, status: ShiftStatus) -> VolunteerShift {
        let now = Utc::now();
        VolunteerShift {
            id: Uuid::new_v4(),
            organization_id: f.ctx.organization_id(),
            volunteer_id: f.request.volunteer_id,
            opportunity_id: f.request.opportunity_id,
            location_id: None,
            shift_date: f.request.shift_date,
            start_time: start,
            end_time: end,
            status,
            notes: None,
            checked_in_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn run(f: &Fixture) -> Result<(), ScheduleError> {
        evaluate(
            &f.ctx,
            &f.request,
            &f.snapshot,
            &SchedulingConfig::default(),
            d(2025, 5, 1),
        )
    }

    #[test]
    fn accepts_clean_request() {
        assert!(run(&fixture()).is_ok());
    }

    #[test]
    fn inverted_range_is_checked_first() {
        let mut f = fixture();
        f.request.start_time = t(11, 0);
        f.request.end_time = t(10, 0);
        f.snapshot.volunteer = None;
        assert!(matches!(run(&f), Err(ScheduleError::InvalidTimeRange)));
    }

    #[test]
    fn foreign_records_look_missing() {
        let mut f = fixture();
        if let Some(v) = f.snapshot.volunteer.as_mut() {
            v.organization_id = Uuid::new_v4();
        }
        assert!(matches!(
            run(&f),
            Err(ScheduleError::VolunteerNotFound { .. })
        ));

        let mut f = fixture();
        f.snapshot.opportunity = None;
        assert!(matches!(
            run(&f),
            Err(ScheduleError::OpportunityNotFound { .. })
        ));
    }

    #[test]
    fn overlapping_shift_conflicts_but_adjacent_does_not() {
        let mut f = fixture();
        let existing = shift(&f, t(9, 0), t(10, 0), ShiftStatus::Scheduled);
        f.snapshot.volunteer_shifts.push(existing.clone());
        assert!(matches!(
            run(&f),
            Err(ScheduleError::TimeConflict { conflicting_shift_id }) if conflicting_shift_id == existing.id
        ));

        f.request.start_time = t(10, 0);
        f.request.end_time = t(11, 0);
        assert!(run(&f).is_ok());
    }

    #[test]
    fn cancelled_shift_does_not_conflict() {
        let mut f = fixture();
        let cancelled = shift(&f, t(9, 0), t(10, 0), ShiftStatus::Cancelled);
        f.snapshot.volunteer_shifts.push(cancelled);
        assert!(run(&f).is_ok());
    }

    #[test]
    fn conflict_check_can_exclude_the_shift_being_moved() {
        let f = fixture();
        let own = shift(&f, t(9, 0), t(10, 0), ShiftStatus::Confirmed);
        let range = TimeRange::new(t(9, 30), t(10, 30)).unwrap();
        let shifts = vec![own.clone()];
        assert!(find_conflict(&range, &shifts, None).is_some());
        assert!(find_conflict(&range, &shifts, Some(own.id)).is_none());
    }

    #[test]
    fn open_ended_blackout_rejects() {
        let mut f = fixture();
        let now = Utc::now();
        f.snapshot.availability.push(VolunteerAvailability {
            id: Uuid::new_v4(),
            organization_id: f.ctx.organization_id(),
            volunteer_id: f.request.volunteer_id,
            kind: AvailabilityKind::Blackout,
            day_of_week: None,
            start_time: None,
            end_time: None,
            start_date: Some(d(2025, 5, 20)),
            end_date: None,
            is_available: false,
            reason: Some("Travel".into()),
            created_at: now,
            updated_at: now,
        });
        assert!(matches!(run(&f), Err(ScheduleError::VolunteerUnavailable)));
    }

    #[test]
    fn expired_check_on_nursery_role_wins_over_skills() {
        let mut f = fixture();
        if let Some(o) = f.snapshot.opportunity.as_mut() {
            o.category = Some("Kids Ministry – Nursery".into());
            o.required_skills = vec!["Infant Care".into()];
        }
        if let Some(v) = f.snapshot.volunteer.as_mut() {
            v.background_check_status = BackgroundCheckStatus::Expired;
            v.background_check_expires_on = Some(d(2024, 1, 1));
        }
        assert!(matches!(run(&f), Err(ScheduleError::BackgroundCheckExpired)));
    }

    #[test]
    fn background_gate_outcomes() {
        let f = fixture();
        let mut v = f.snapshot.volunteer.clone().unwrap();
        let today = d(2025, 6, 1);

        assert!(check_background(&v, today).is_ok());

        v.background_check_expires_on = Some(today);
        assert!(check_background(&v, today).is_ok());

        v.background_check_expires_on = Some(d(2025, 5, 31));
        assert!(matches!(
            check_background(&v, today),
            Err(ScheduleError::BackgroundCheckExpired)
        ));

        v.background_check_status = BackgroundCheckStatus::InProgress;
        v.background_check_expires_on = None;
        assert!(matches!(
            check_background(&v, today),
            Err(ScheduleError::BackgroundCheckRequired)
        ));

        v.background_check_status = BackgroundCheckStatus::Flagged;
        assert!(matches!(
            check_background(&v, today),
            Err(ScheduleError::BackgroundCheckRequired)
        ));
    }

    #[test]
    fn sensitive_categories_match_case_insensitively() {
        let keywords = SchedulingConfig::default().sensitive_category_keywords;
        assert!(requires_background_check(Some("YOUTH Group"), &keywords));
        assert!(requires_background_check(Some("Preschool room"), &keywords));
        assert!(!requires_background_check(Some("Parking"), &keywords));
        assert!(!requires_background_check(None, &keywords));
    }

    #[test]
    fn missing_skills_ignore_case_and_whitespace() {
        let required = vec![" CPR ".to_string(), "Sound".into(), "sound".into()];
        let declared = vec!["cpr".to_string()];
        assert_eq!(missing_skills(&required, &declared), vec!["Sound"]);
        assert!(missing_skills(&[], &declared).is_empty());
    }

    #[test]
    fn capacity_ignores_cancelled_and_no_show() {
        let mut f = fixture();
        let taken = shift(&f, t(8, 0), t(9, 0), ShiftStatus::Confirmed);
        let cancelled = shift(&f, t(8, 0), t(9, 0), ShiftStatus::Cancelled);
        let no_show = shift(&f, t(8, 0), t(9, 0), ShiftStatus::NoShow);
        f.snapshot.opportunity_shifts = vec![taken.clone(), cancelled, no_show];
        assert!(run(&f).is_ok());

        f.snapshot.opportunity_shifts.push(taken);
        assert!(matches!(
            run(&f),
            Err(ScheduleError::OpportunityFull {
                volunteers_needed: 2
            })
        ));
    }

    #[test]
    fn zero_capacity_is_always_full() {
        let mut f = fixture();
        if let Some(o) = f.snapshot.opportunity.as_mut() {
            o.volunteers_needed = 0;
        }
        assert!(matches!(
            run(&f),
            Err(ScheduleError::OpportunityFull { .. })
        ));
    }

    #[test]
    fn availability_windows_are_validated() {
        let blackout = AvailabilityWindow {
            kind: AvailabilityKind::Blackout,
            day_of_week: None,
            start_time: None,
            end_time: None,
            start_date: Some(d(2025, 6, 1)),
            end_date: None,
        };
        assert!(blackout.validate().is_ok());

        let mut bad = blackout.clone();
        bad.end_date = Some(d(2025, 5, 1));
        assert!(bad.validate().is_err());
        bad.start_date = None;
        assert!(bad.validate().is_err());

        let recurring = AvailabilityWindow {
            kind: AvailabilityKind::Recurring,
            day_of_week: Some(6),
            start_time: Some(t(8, 0)),
            end_time: Some(t(12, 0)),
            start_date: None,
            end_date: None,
        };
        assert!(recurring.validate().is_ok());

        let mut bad = recurring.clone();
        bad.day_of_week = Some(7);
        assert!(bad.validate().is_err());
        let mut bad = recurring;
        bad.end_time = Some(t(8, 0));
        assert!(bad.validate().is_err());
    }
}
