//! Custom Axum extractors.

pub mod client_id;

pub use client_id::{ClientId, FORWARDED_FOR_HEADER};
