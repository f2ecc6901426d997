//! Flock Server — HTTP API and configuration for the scheduling service.

pub mod api;
pub mod config;
