//! Persistence layer for GLPI ticket reports.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (aggregate row mappings)
//! - The ticket metrics repository
//! - Query timing metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
