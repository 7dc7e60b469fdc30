//! Domain services for ticket reports.
//!
//! Services contain business logic that operates on domain models.

pub mod metrics_source;
pub mod report_builder;

pub use metrics_source::{MetricsError, MetricsSource, MockMetricsSource};
pub use report_builder::{resolve_sections, ReportBuildError, ReportBuilder};
