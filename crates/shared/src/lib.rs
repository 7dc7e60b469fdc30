//! Shared utilities for the GLPI reports backend.
//!
//! This crate provides request validation helpers used by the API layer:
//! export format checks, strict ISO date parsing and period span limits.

pub mod validation;
