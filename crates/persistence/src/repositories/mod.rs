//! Repository implementations for database operations.

pub mod metrics;

pub use metrics::MetricsRepository;
