//! Render error types.

use thiserror::Error;

use crate::pdf::BackendError;

/// Errors raised while turning a report into an artifact.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid spreadsheet package: {0}")]
    InvalidPackage(String),

    #[error("Invalid cell {reference} in sheet '{sheet}': {reason}")]
    InvalidCell {
        sheet: String,
        reference: String,
        reason: String,
    },

    #[error("PDF backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid PDF document: {0}")]
    InvalidDocument(String),
}
