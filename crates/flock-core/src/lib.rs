//! Flock Core — domain models, repository traits and the shared error
//! type for the volunteer scheduling service.
//!
//! Every tenant-scoped entity carries an `organization_id`, and every
//! tenant-scoped repository operation takes it as an explicit argument.

pub mod error;
pub mod models;
pub mod repository;
