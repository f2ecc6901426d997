//! Volunteer domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BackgroundCheckStatus {
    #[default]
    NotStarted,
    InProgress,
    Cleared,
    Flagged,
    Expired,
}

impl BackgroundCheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::InProgress => "InProgress",
            Self::Cleared => "Cleared",
            Self::Flagged => "Flagged",
            Self::Expired => "Expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NotStarted" => Some(Self::NotStarted),
            "InProgress" => Some(Self::InProgress),
            "Cleared" => Some(Self::Cleared),
            "Flagged" => Some(Self::Flagged),
            "Expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Declared skills, free-form labels (e.g. `sound`, `first aid`).
    pub skills: Vec<String>,
    pub background_check_status: BackgroundCheckStatus,
    /// `None` means the check does not expire.
    pub background_check_expires_on: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVolunteer {
    pub organization_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub background_check_status: BackgroundCheckStatus,
    pub background_check_expires_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateVolunteer {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub email: Option<Option<String>>,
    pub skills: Option<Vec<String>>,
    pub background_check_status: Option<BackgroundCheckStatus>,
    pub background_check_expires_on: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}
