//! HTML-to-PDF backend capability.

use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a PDF backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("PDF backend request failed: {0}")]
    Request(String),

    #[error("PDF backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("PDF backend timed out")]
    Timeout,
}

/// Paper format of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    /// Width and height in inches, portrait orientation.
    pub fn inches(&self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (8.27, 11.7),
            PaperSize::Letter => (8.5, 11.0),
        }
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            other => Err(format!("Unknown paper size: {}", other)),
        }
    }
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 40.0,
            right: 15.0,
            bottom: 25.0,
            left: 15.0,
        }
    }
}

pub(crate) const MM_PER_INCH: f64 = 25.4;

impl Margins {
    /// Margins converted to inches, in top/right/bottom/left order.
    pub fn inches(&self) -> [f64; 4] {
        [self.top, self.right, self.bottom, self.left].map(|mm| mm / MM_PER_INCH)
    }
}

/// Paper, orientation and margins of the document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageSetup {
    pub paper: PaperSize,
    pub landscape: bool,
    pub margins: Margins,
}

/// Everything a backend needs to produce one document.
///
/// `header_html` and `footer_html` are repeated on every page. They may use
/// `<span class="pageNumber"></span>` and `<span class="totalPages"></span>`
/// placeholders, which the backend substitutes per page.
#[derive(Debug, Clone)]
pub struct PdfJob {
    pub title: String,
    pub body_html: String,
    pub header_html: String,
    pub footer_html: String,
    pub page: PageSetup,
}

/// Converts composed HTML into PDF bytes.
#[async_trait]
pub trait PdfBackend: Send + Sync {
    async fn render(&self, job: PdfJob) -> Result<Vec<u8>, BackendError>;

    /// Whether the backend is reachable. Backends without a probe report healthy.
    async fn health(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
