//! Paginated PDF document renderer.
//!
//! The body is composed as HTML (index page, then one page-broken block per
//! section) and handed to a [`PdfBackend`] together with running header and
//! footer fragments.

pub mod backend;
pub mod templates;

use std::sync::Arc;

use domain::models::Report;
use tracing::{debug, warn};

use crate::error::RenderError;
pub use backend::{BackendError, Margins, PageSetup, PaperSize, PdfBackend, PdfJob};
use templates::{document_html, footer_html, header_html, section_page, IndexEntry};

/// Magic bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Page of the first section; page 1 is the index.
pub const FIRST_SECTION_PAGE: usize = 2;

/// Renders reports through an HTML-to-PDF backend.
#[derive(Clone)]
pub struct DocumentRenderer {
    backend: Arc<dyn PdfBackend>,
    page: PageSetup,
    logo: Option<String>,
}

impl DocumentRenderer {
    pub fn new(backend: Arc<dyn PdfBackend>) -> Self {
        Self {
            backend,
            page: PageSetup::default(),
            logo: None,
        }
    }

    pub fn with_page(mut self, page: PageSetup) -> Self {
        self.page = page;
        self
    }

    /// Sets the header logo, given as a `data:` URI.
    pub fn with_logo(mut self, logo: Option<String>) -> Self {
        self.logo = logo;
        self
    }

    /// Index entries in report order, numbered from the first section page.
    pub fn index_entries(report: &Report) -> Vec<IndexEntry> {
        report
            .sections()
            .iter()
            .enumerate()
            .map(|(i, section)| IndexEntry {
                name: section.name(),
                page: FIRST_SECTION_PAGE + i,
            })
            .collect()
    }

    /// Builds the backend job for `report` without rendering it.
    pub fn compose(&self, report: &Report) -> PdfJob {
        let metadata = report.metadata();
        let sections: Vec<String> = report
            .sections()
            .iter()
            .map(|section| section_page(&section.data))
            .collect();

        PdfJob {
            title: metadata.title.clone(),
            body_html: document_html(&metadata.title, &Self::index_entries(report), &sections),
            header_html: header_html(&metadata.title, &metadata.period, self.logo.as_deref()),
            footer_html: footer_html(&metadata.generated_at_label()),
            page: self.page,
        }
    }

    /// Renders `report` and checks the backend answered with a PDF.
    pub async fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        let job = self.compose(report);
        debug!(
            sections = report.sections().len(),
            body_bytes = job.body_html.len(),
            "Sending document to PDF backend"
        );

        let bytes = self.backend.render(job).await?;
        if !bytes.starts_with(PDF_MAGIC) {
            warn!(len = bytes.len(), "PDF backend returned a non-PDF payload");
            return Err(RenderError::InvalidDocument(
                "backend output is not a PDF document".to_string(),
            ));
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for DocumentRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRenderer")
            .field("page", &self.page)
            .field("logo", &self.logo.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty_report, report_with, sample_report, sample_sections};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use templates::NO_DATA;

    struct RecordingBackend {
        output: Vec<u8>,
        jobs: Mutex<Vec<PdfJob>>,
    }

    impl RecordingBackend {
        fn new(output: &[u8]) -> Arc<Self> {
            Arc::new(Self {
                output: output.to_vec(),
                jobs: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PdfBackend for RecordingBackend {
        async fn render(&self, job: PdfJob) -> Result<Vec<u8>, BackendError> {
            self.jobs.lock().unwrap().push(job);
            Ok(self.output.clone())
        }
    }

    struct DownBackend;

    #[async_trait]
    impl PdfBackend for DownBackend {
        async fn render(&self, _job: PdfJob) -> Result<Vec<u8>, BackendError> {
            Err(BackendError::Status {
                status: 503,
                body: "busy".into(),
            })
        }
    }

    #[test]
    fn test_index_pages_start_at_two_and_increase() {
        let entries = DocumentRenderer::index_entries(&sample_report());
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].name, "Executive Summary");
        assert_eq!(entries[0].page, 2);
        assert!(entries.windows(2).all(|w| w[1].page == w[0].page + 1));
    }

    #[test]
    fn test_index_follows_report_order() {
        let mut sections = sample_sections();
        sections.reverse();
        let report = report_with(sections.into_iter().take(3).collect());
        let names: Vec<&str> = DocumentRenderer::index_entries(&report)
            .iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(
            names,
            vec!["Satisfaction Ratings", "Overdue Tickets (SLA)", "Resolution Time"]
        );
    }

    #[test]
    fn test_one_page_break_per_section() {
        let backend = RecordingBackend::new(b"%PDF-1.7");
        let job = DocumentRenderer::new(backend).compose(&sample_report());
        assert_eq!(job.body_html.matches(r#"<div class="section""#).count(), 10);
        let index = job.body_html.find("INDEX").unwrap();
        assert!(index < job.body_html.find("EXECUTIVE SUMMARY").unwrap());
    }

    #[test]
    fn test_every_empty_section_but_summary_gets_placeholder() {
        let backend = RecordingBackend::new(b"%PDF-1.7");
        let job = DocumentRenderer::new(backend).compose(&empty_report());
        assert_eq!(job.body_html.matches(NO_DATA).count(), 9);
        assert!(job.body_html.contains(r#"<table class="cards">"#));
    }

    #[test]
    fn test_running_furniture_uses_metadata() {
        let backend = RecordingBackend::new(b"%PDF-1.7");
        let job = DocumentRenderer::new(backend)
            .with_logo(Some("data:image/png;base64,iVBORw0K".into()))
            .compose(&sample_report());

        assert_eq!(job.title, "Ticket Report");
        assert!(job.header_html.contains("Period: 2024-01-01 to 2024-01-31"));
        assert!(job.header_html.contains("data:image/png;base64,iVBORw0K"));
        assert!(job.footer_html.contains("Generated at 01/02/2024 09:30:05"));
        assert_eq!(job.page, PageSetup::default());
    }

    #[tokio::test]
    async fn test_render_returns_backend_bytes() {
        let backend = RecordingBackend::new(b"%PDF-1.7\n%%EOF");
        let renderer = DocumentRenderer::new(backend.clone());
        let bytes = renderer.render(&sample_report()).await.unwrap();

        assert!(bytes.starts_with(PDF_MAGIC));
        assert_eq!(backend.jobs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_render_rejects_non_pdf_output() {
        let renderer = DocumentRenderer::new(RecordingBackend::new(b"<html>error</html>"));
        let err = renderer.render(&sample_report()).await.unwrap_err();
        assert!(matches!(err, RenderError::InvalidDocument(_)));
    }

    #[tokio::test]
    async fn test_render_propagates_backend_errors() {
        let renderer = DocumentRenderer::new(Arc::new(DownBackend));
        let err = renderer.render(&sample_report()).await.unwrap_err();
        assert!(matches!(err, RenderError::Backend(BackendError::Status { status: 503, .. })));
    }
}
