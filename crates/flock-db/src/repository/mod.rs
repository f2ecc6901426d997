//! SurrealDB repository implementations.
//!
//! Identifiers, dates and times are stored as strings; the helpers in
//! this module convert between the stored form and the domain types.

mod availability;
mod opportunity;
mod organization;
mod shift;
mod volunteer;

pub use availability::SurrealAvailabilityRepository;
pub use opportunity::SurrealOpportunityRepository;
pub use organization::SurrealOrganizationRepository;
pub use shift::SurrealShiftRepository;
pub use volunteer::SurrealVolunteerRepository;

use chrono::{NaiveDate, NaiveTime};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn count_from(rows: Vec<CountRow>) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

fn parse_opt_uuid(value: Option<String>, field: &str) -> Result<Option<Uuid>, DbError> {
    value.map(|v| parse_uuid(&v, field)).transpose()
}

/// Use the id the caller already knows, or fall back to the projected
/// `meta::id(id) AS record_id` column.
fn resolve_id(known: Option<Uuid>, record_id: Option<&str>) -> Result<Uuid, DbError> {
    match (known, record_id) {
        (Some(id), _) => Ok(id),
        (None, Some(raw)) => parse_uuid(raw, "record"),
        (None, None) => Err(DbError::Decode("row is missing record_id".into())),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DbError::Decode(format!("invalid {field} date {value:?}: {e}")))
}

fn parse_opt_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>, DbError> {
    value.map(|v| parse_date(&v, field)).transpose()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_time(value: &str, field: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|e| DbError::Decode(format!("invalid {field} time {value:?}: {e}")))
}

fn parse_opt_time(value: Option<String>, field: &str) -> Result<Option<NaiveTime>, DbError> {
    value.map(|v| parse_time(&v, field)).transpose()
}

fn first_row<T>(rows: Vec<T>, entity: &str, id: String) -> Result<T, DbError> {
    rows.into_iter().next().ok_or_else(|| DbError::NotFound {
        entity: entity.into(),
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_and_time_roundtrip_through_storage_format() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(format_date(date), "2025-06-01");
        assert_eq!(format_time(time), "09:30:00");
        assert_eq!(parse_date("2025-06-01", "shift").unwrap(), date);
        assert_eq!(parse_time("09:30:00", "start").unwrap(), time);
    }

    #[test]
    fn sub_second_times_survive_storage() {
        let time = NaiveTime::from_hms_milli_opt(9, 0, 0, 500).unwrap();
        let stored = format_time(time);
        assert_eq!(stored, "09:00:00.500");
        assert_eq!(parse_time(&stored, "start").unwrap(), time);
        assert!(format_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap()) < stored);
        assert!(stored < format_time(NaiveTime::from_hms_opt(9, 0, 1).unwrap()));
    }

    #[test]
    fn stored_dates_sort_lexicographically() {
        let a = format_date(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
        let b = format_date(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap());
        assert!(a < b);
    }

    #[test]
    fn malformed_values_are_decode_errors() {
        assert!(matches!(
            parse_date("06/01/2025", "shift"),
            Err(DbError::Decode(_))
        ));
        assert!(matches!(parse_uuid("nope", "volunteer"), Err(DbError::Decode(_))));
    }

    #[test]
    fn resolve_id_prefers_known_id() {
        let known = Uuid::new_v4();
        let other = Uuid::new_v4().to_string();
        assert_eq!(resolve_id(Some(known), Some(&other)).unwrap(), known);
        assert!(resolve_id(None, None).is_err());
    }
}
