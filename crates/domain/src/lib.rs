//! Domain layer for GLPI ticket reports.
//!
//! This crate contains:
//! - Domain models (section catalogue, ticket metrics datasets, Report)
//! - The metrics source abstraction and the report builder
//! - Domain error types

pub mod models;
pub mod services;
