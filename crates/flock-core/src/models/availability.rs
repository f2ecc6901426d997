//! Volunteer availability domain model.
//!
//! A record is either a recurring weekly pattern (`day_of_week` plus a
//! time window) or a one-off blackout between two dates. A blackout with
//! no `end_date` is open-ended.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AvailabilityKind {
    Recurring,
    Blackout,
}

impl AvailabilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recurring => "Recurring",
            Self::Blackout => "Blackout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Recurring" => Some(Self::Recurring),
            "Blackout" => Some(Self::Blackout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerAvailability {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub volunteer_id: Uuid,
    pub kind: AvailabilityKind,
    /// 0 = Monday … 6 = Sunday. Recurring entries only.
    pub day_of_week: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_available: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VolunteerAvailability {
    /// True when this is an unavailability window covering `date`.
    pub fn blacks_out(&self, date: NaiveDate) -> bool {
        if self.kind != AvailabilityKind::Blackout || self.is_available {
            return false;
        }
        let Some(start) = self.start_date else {
            return false;
        };
        start <= date && self.end_date.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailability {
    pub organization_id: Uuid,
    pub volunteer_id: Uuid,
    pub kind: AvailabilityKind,
    pub day_of_week: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_available: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAvailability {
    pub day_of_week: Option<Option<u8>>,
    pub start_time: Option<Option<NaiveTime>>,
    pub end_time: Option<Option<NaiveTime>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub is_available: Option<bool>,
    pub reason: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn blackout(start: Option<NaiveDate>, end: Option<NaiveDate>) -> VolunteerAvailability {
        VolunteerAvailability {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            volunteer_id: Uuid::new_v4(),
            kind: AvailabilityKind::Blackout,
            day_of_week: None,
            start_time: None,
            end_time: None,
            start_date: start,
            end_date: end,
            is_available: false,
            reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn closed_blackout_is_inclusive() {
        let b = blackout(Some(d(2025, 6, 1)), Some(d(2025, 6, 7)));
        assert!(!b.blacks_out(d(2025, 5, 31)));
        assert!(b.blacks_out(d(2025, 6, 1)));
        assert!(b.blacks_out(d(2025, 6, 7)));
        assert!(!b.blacks_out(d(2025, 6, 8)));
    }

    #[test]
    fn open_blackout_never_ends() {
        let b = blackout(Some(d(2025, 6, 1)), None);
        assert!(!b.blacks_out(d(2025, 5, 31)));
        assert!(b.blacks_out(d(2025, 6, 1)));
        assert!(b.blacks_out(d(2099, 12, 31)));
    }

    #[test]
    fn available_or_recurring_records_never_block() {
        let mut b = blackout(Some(d(2025, 6, 1)), None);
        b.is_available = true;
        assert!(!b.blacks_out(d(2025, 6, 2)));

        let mut r = blackout(Some(d(2025, 6, 1)), None);
        r.kind = AvailabilityKind::Recurring;
        assert!(!r.blacks_out(d(2025, 6, 2)));
    }
}
