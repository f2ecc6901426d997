//! Volunteer shift domain model.
//!
//! A shift links one volunteer to one serving opportunity on a calendar
//! date for a time-of-day window. Shifts are never hard-deleted; they move
//! through [`ShiftStatus`] instead. Every write bumps `version`, which
//! callers echo back to detect stale updates.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ShiftStatus {
    Scheduled,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    NoShow,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Confirmed => "Confirmed",
            Self::CheckedIn => "CheckedIn",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "NoShow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Scheduled" => Some(Self::Scheduled),
            "Confirmed" => Some(Self::Confirmed),
            "CheckedIn" => Some(Self::CheckedIn),
            "Completed" => Some(Self::Completed),
            "Cancelled" => Some(Self::Cancelled),
            "NoShow" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// Whether a shift in this status still occupies the volunteer's time.
    pub fn blocks_volunteer(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether a shift in this status takes one of the opportunity's slots.
    pub fn counts_toward_capacity(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::NoShow)
    }

    pub fn can_transition_to(&self, next: ShiftStatus) -> bool {
        use ShiftStatus::*;
        matches!(
            (self, next),
            (Scheduled, Confirmed)
                | (Scheduled | Confirmed, Cancelled)
                | (Scheduled | Confirmed, CheckedIn)
                | (Scheduled | Confirmed, NoShow)
                | (CheckedIn, Completed)
        )
    }
}

/// A half-open time-of-day window `[start, end)` on a single date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Returns `None` unless `start < end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Two windows on the same date conflict iff each starts before the
    /// other ends. Touching windows (`09:00-10:00`, `10:00-11:00`) do not.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolunteerShift {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub volunteer_id: Uuid,
    pub opportunity_id: Uuid,
    pub location_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ShiftStatus,
    pub notes: Option<String>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VolunteerShift {
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Insert payload. Only the scheduling service should construct this.
///
/// The store re-checks two things atomically with the insert: the
/// volunteer has no overlapping shift that blocks them on the date, and
/// fewer than `volunteers_needed` capacity-counting shifts exist for the
/// opportunity on the date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShift {
    pub organization_id: Uuid,
    pub volunteer_id: Uuid,
    pub opportunity_id: Uuid,
    pub location_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub volunteers_needed: u32,
}

/// Why a guarded shift insert was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotConflict {
    VolunteerBusy { shift_id: Uuid },
    OpportunityFull { volunteers_needed: u32 },
}

impl fmt::Display for SlotConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VolunteerBusy { shift_id } => write!(f, "volunteer busy with shift {shift_id}"),
            Self::OpportunityFull { volunteers_needed } => {
                write!(f, "all {volunteers_needed} slots taken")
            }
        }
    }
}

/// Partial update applied under optimistic locking.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateShift {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub location_id: Option<Option<Uuid>>,
    pub notes: Option<Option<String>>,
    pub status: Option<ShiftStatus>,
    pub checked_in_at: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let a = TimeRange::new(t(9, 0), t(10, 0)).unwrap();
        let b = TimeRange::new(t(10, 0), t(11, 0)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn partial_and_contained_ranges_overlap() {
        let base = TimeRange::new(t(9, 0), t(10, 0)).unwrap();
        let later = TimeRange::new(t(9, 30), t(10, 30)).unwrap();
        let wrapping = TimeRange::new(t(8, 0), t(12, 0)).unwrap();
        assert!(base.overlaps(&later));
        assert!(base.overlaps(&wrapping));
        assert!(wrapping.overlaps(&base));
    }

    #[test]
    fn empty_or_inverted_range_is_rejected() {
        assert!(TimeRange::new(t(9, 0), t(9, 0)).is_none());
        assert!(TimeRange::new(t(10, 0), t(9, 0)).is_none());
    }

    #[test]
    fn status_capacity_and_blocking() {
        assert!(ShiftStatus::Scheduled.counts_toward_capacity());
        assert!(!ShiftStatus::NoShow.counts_toward_capacity());
        assert!(!ShiftStatus::Cancelled.counts_toward_capacity());
        assert!(ShiftStatus::NoShow.blocks_volunteer());
        assert!(!ShiftStatus::Cancelled.blocks_volunteer());
    }

    #[test]
    fn terminal_statuses_cannot_move() {
        for next in [
            ShiftStatus::Scheduled,
            ShiftStatus::Confirmed,
            ShiftStatus::CheckedIn,
            ShiftStatus::Completed,
            ShiftStatus::NoShow,
        ] {
            assert!(!ShiftStatus::Cancelled.can_transition_to(next));
        }
        assert!(!ShiftStatus::Completed.can_transition_to(ShiftStatus::Cancelled));
        assert!(ShiftStatus::Confirmed.can_transition_to(ShiftStatus::CheckedIn));
        assert!(ShiftStatus::CheckedIn.can_transition_to(ShiftStatus::Completed));
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            ShiftStatus::Scheduled,
            ShiftStatus::Confirmed,
            ShiftStatus::CheckedIn,
            ShiftStatus::Completed,
            ShiftStatus::Cancelled,
            ShiftStatus::NoShow,
        ] {
            assert_eq!(ShiftStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ShiftStatus::parse("SCHEDULED"), None);
    }
}
