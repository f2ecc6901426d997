//! Serving opportunity domain model.
//!
//! A serving opportunity is a recurring need (greeter team, nursery,
//! sound desk) that volunteers are scheduled into, one shift at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServingOpportunity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    /// Ministry category label (e.g. `Kids Ministry – Nursery`).
    pub category: Option<String>,
    pub required_skills: Vec<String>,
    /// Headcount per date; also the scheduling capacity.
    pub volunteers_needed: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOpportunity {
    pub organization_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub volunteers_needed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOpportunity {
    pub name: Option<String>,
    pub category: Option<Option<String>>,
    pub required_skills: Option<Vec<String>>,
    pub volunteers_needed: Option<u32>,
    pub is_active: Option<bool>,
}
