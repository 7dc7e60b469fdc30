//! Gotenberg HTML-to-PDF client.
//!
//! Posts the composed document to the Chromium HTML route. The running header
//! and footer travel as `header.html` and `footer.html`; Chromium fills their
//! `pageNumber` and `totalPages` spans on every page.

use std::time::Duration;

use async_trait::async_trait;
use export::{BackendError, PageSetup, PdfBackend, PdfJob};
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use tracing::{debug, warn};

use crate::config::PdfConfig;

/// Route converting an HTML bundle into a PDF.
pub const CONVERT_HTML_ROUTE: &str = "/forms/chromium/convert/html";

/// Liveness route of the service.
pub const HEALTH_ROUTE: &str = "/health";

const HTML_MIME: &str = "text/html; charset=utf-8";

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// Client for a Gotenberg instance.
#[derive(Debug, Clone)]
pub struct GotenbergClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
}

impl GotenbergClient {
    pub fn new(config: &PdfConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| BackendError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn convert_url(&self) -> String {
        format!("{}{}", self.base_url, CONVERT_HTML_ROUTE)
    }

    fn map_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            warn!(timeout_ms = self.timeout_ms, "PDF backend request timed out");
            BackendError::Timeout
        } else {
            BackendError::Request(err.to_string())
        }
    }
}

/// Page form fields for the Chromium route. Sizes are in inches.
pub fn page_fields(page: &PageSetup) -> Vec<(&'static str, String)> {
    let (width, height) = page.paper.inches();
    let [top, right, bottom, left] = page.margins.inches();

    vec![
        ("paperWidth", format!("{:.2}", width)),
        ("paperHeight", format!("{:.2}", height)),
        ("marginTop", format!("{:.2}", top)),
        ("marginRight", format!("{:.2}", right)),
        ("marginBottom", format!("{:.2}", bottom)),
        ("marginLeft", format!("{:.2}", left)),
        ("landscape", page.landscape.to_string()),
        ("printBackground", "true".to_string()),
        ("preferCssPageSize", "false".to_string()),
    ]
}

fn html_part(file_name: &'static str, html: String) -> Result<Part, BackendError> {
    Part::text(html)
        .file_name(file_name)
        .mime_str(HTML_MIME)
        .map_err(|e| BackendError::Request(e.to_string()))
}

fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[async_trait]
impl PdfBackend for GotenbergClient {
    async fn render(&self, job: PdfJob) -> Result<Vec<u8>, BackendError> {
        let mut form = Form::new()
            .part("files", html_part("index.html", job.body_html)?)
            .part("files", html_part("header.html", job.header_html)?)
            .part("files", html_part("footer.html", job.footer_html)?);
        for (name, value) in page_fields(&job.page) {
            form = form.text(name, value);
        }

        let url = self.convert_url();
        debug!(url = %url, title = %job.title, "Calling Gotenberg");

        let response = self
            .client
            .post(&url)
            .header("Gotenberg-Output-Filename", "report")
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(bytes.to_vec())
    }

    async fn health(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, HEALTH_ROUTE))
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Status {
                status: response.status().as_u16(),
                body: String::new(),
            })
        }
    }
}
