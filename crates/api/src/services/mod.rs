//! Application services.

pub mod export;
pub mod gotenberg;

pub use export::{ExportArtifact, ExportError, ExportFormat, ExportRequest, ExportService};
pub use gotenberg::GotenbergClient;
