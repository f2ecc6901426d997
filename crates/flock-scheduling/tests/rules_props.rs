//! Property tests for the capacity and skill rules.

use chrono::{NaiveDate, NaiveTime, Utc};
use flock_core::models::opportunity::ServingOpportunity;
use flock_core::models::shift::{ShiftStatus, VolunteerShift};
use flock_core::models::volunteer::{BackgroundCheckStatus, Volunteer};
use flock_scheduling::rules::{self, OrgContext, SchedulingSnapshot, ShiftRequest};
use flock_scheduling::{ScheduleError, SchedulingConfig};
use proptest::prelude::*;
use proptest::test_runner::Config;
use uuid::Uuid;

fn status() -> impl Strategy<Value = ShiftStatus> {
    prop_oneof![
        Just(ShiftStatus::Scheduled),
        Just(ShiftStatus::Confirmed),
        Just(ShiftStatus::CheckedIn),
        Just(ShiftStatus::Completed),
        Just(ShiftStatus::Cancelled),
        Just(ShiftStatus::NoShow),
    ]
}

fn skill() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("CPR".to_string()),
        Just("cpr".to_string()),
        Just(" Sound ".to_string()),
        Just("sound".to_string()),
        Just("Piano".to_string()),
        Just("Driving".to_string()),
    ]
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn time(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn snapshot(org: Uuid, needed: u32, statuses: &[ShiftStatus]) -> (SchedulingSnapshot, ShiftRequest) {
    let now = Utc::now();
    let volunteer = Volunteer {
        id: Uuid::new_v4(),
        organization_id: org,
        name: "Ruth".into(),
        email: None,
        skills: vec![],
        background_check_status: BackgroundCheckStatus::NotStarted,
        background_check_expires_on: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let opportunity = ServingOpportunity {
        id: Uuid::new_v4(),
        organization_id: org,
        name: "Greeter".into(),
        category: None,
        required_skills: vec![],
        volunteers_needed: needed,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let opportunity_shifts = statuses
        .iter()
        .map(|&status| VolunteerShift {
            id: Uuid::new_v4(),
            organization_id: org,
            volunteer_id: Uuid::new_v4(),
            opportunity_id: opportunity.id,
            location_id: None,
            shift_date: date(),
            start_time: time(9),
            end_time: time(10),
            status,
            notes: None,
            checked_in_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        })
        .collect();
    let request = ShiftRequest {
        volunteer_id: volunteer.id,
        opportunity_id: opportunity.id,
        location_id: None,
        shift_date: date(),
        start_time: time(9),
        end_time: time(10),
        notes: None,
    };
    (
        SchedulingSnapshot {
            volunteer: Some(volunteer),
            opportunity: Some(opportunity),
            opportunity_shifts,
            ..Default::default()
        },
        request,
    )
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn full_exactly_when_counted_shifts_reach_capacity(
        needed in 0_u32..6,
        statuses in prop::collection::vec(status(), 0..10),
    ) {
        let org = Uuid::new_v4();
        let (snapshot, request) = snapshot(org, needed, &statuses);
        let counted = statuses.iter().filter(|s| s.counts_toward_capacity()).count();

        let outcome = rules::evaluate(
            &OrgContext::new(org),
            &request,
            &snapshot,
            &SchedulingConfig::default(),
            date(),
        );
        let is_full = matches!(outcome, Err(ScheduleError::OpportunityFull { .. }));
        prop_assert_eq!(is_full, counted >= needed as usize);
        prop_assert_eq!(outcome.is_ok(), counted < needed as usize);
    }

    #[test]
    fn missing_skills_are_required_and_undeclared(
        required in prop::collection::vec(skill(), 0..6),
        declared in prop::collection::vec(skill(), 0..6),
    ) {
        let norm = |s: &str| s.trim().to_lowercase();
        let missing = rules::missing_skills(&required, &declared);

        for m in &missing {
            prop_assert!(required.iter().any(|r| norm(r) == norm(m)));
            prop_assert!(!declared.iter().any(|d| norm(d) == norm(m)));
        }
        for r in &required {
            let covered = declared.iter().any(|d| norm(d) == norm(r));
            prop_assert_eq!(covered, !missing.iter().any(|m| norm(m) == norm(r)));
        }
    }
}
