//! Scheduling configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the scheduling service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Opportunity categories containing any of these keywords
    /// (case-insensitive) require a cleared background check.
    pub sensitive_category_keywords: Vec<String>,
    /// Upper bound for one scheduling critical section, in milliseconds
    /// (default: 10_000). Exceeding it fails the request without retry.
    pub transaction_timeout_ms: u64,
}

impl SchedulingConfig {
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            sensitive_category_keywords: [
                "kids",
                "children",
                "child",
                "youth",
                "nursery",
                "student",
                "preschool",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            transaction_timeout_ms: 10_000,
        }
    }
}
