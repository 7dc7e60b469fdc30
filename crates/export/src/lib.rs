//! Report renderers.
//!
//! Turns a built [`domain::models::Report`] into one of three artifacts:
//! - a zipped bundle of CSV files ([`CsvRenderer`])
//! - an OOXML spreadsheet assembled part by part ([`SpreadsheetRenderer`])
//! - a paginated PDF produced through a [`PdfBackend`] ([`DocumentRenderer`])

pub mod csv;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod xlsx;

#[cfg(test)]
mod test_support;

pub use csv::CsvRenderer;
pub use error::RenderError;
pub use pdf::{BackendError, DocumentRenderer, Margins, PageSetup, PaperSize, PdfBackend, PdfJob};
pub use xlsx::SpreadsheetRenderer;
