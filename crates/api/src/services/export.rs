//! Report export service.
//!
//! Builds the report, dispatches it to the renderer of the requested format
//! and hands back an artifact owned by the request. Archive formats are
//! written on the blocking pool into a per-request temporary directory that
//! lives exactly as long as the response body streaming it.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use axum::body::Body;
use chrono::{DateTime, Utc};
use domain::models::{report::UNBOUNDED, Report, ReportFilter};
use domain::services::{ReportBuildError, ReportBuilder};
use export::{CsvRenderer, DocumentRenderer, RenderError, SpreadsheetRenderer};
use futures::StreamExt;
use shared::validation::validate_export_format;
use tempfile::TempDir;
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use validator::ValidationError;

use crate::error::ApiError;
use crate::middleware::metrics::record_export;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Build(#[from] ReportBuildError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render task failed: {0}")]
    Task(String),
}

impl ExportError {
    fn outcome(&self) -> &'static str {
        match self {
            ExportError::Build(_) => "data_error",
            _ => "render_error",
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Build(e) => e.into(),
            ExportError::Render(e) => e.into(),
            other => ApiError::Render(other.to_string()),
        }
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
    Xlsx,
}

impl ExportFormat {
    /// Parses a requested format, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_export_format(raw)?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Ok(ExportFormat::Xlsx),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// File extension of the artifact. CSV exports are zipped bundles.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "zip",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "application/zip",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// A validated export request.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub filter: ReportFilter,
    pub sections: Vec<String>,
}

/// Download name: `report_<from>_<to>_<YYYY-MM-DD_HHMMSS>.<ext>`.
pub fn artifact_filename(
    format: ExportFormat,
    filter: &ReportFilter,
    generated_at: DateTime<Utc>,
) -> String {
    let day = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y%m%d").to_string())
            .unwrap_or_else(|| UNBOUNDED.to_string())
    };
    format!(
        "report_{}_{}_{}.{}",
        day(filter.date_from),
        day(filter.date_to),
        generated_at.format("%Y-%m-%d_%H%M%S"),
        format.extension()
    )
}

/// Where the bytes of an artifact live.
#[derive(Debug)]
pub enum ArtifactData {
    /// A file inside a directory removed when the artifact (or its body) is dropped.
    File { dir: TempDir, path: PathBuf },
    Memory(Vec<u8>),
}

/// A rendered export, owned by the request that produced it.
#[derive(Debug)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub filename: String,
    pub len: u64,
    pub data: ArtifactData,
}

impl ExportArtifact {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// Turns the artifact into a response body.
    ///
    /// File artifacts are streamed; the temporary directory moves into the stream
    /// and is deleted once the body finishes or is dropped.
    pub async fn into_body(self) -> Result<Body, ExportError> {
        match self.data {
            ArtifactData::Memory(bytes) => Ok(Body::from(bytes)),
            ArtifactData::File { dir, path } => {
                let file = tokio::fs::File::open(&path).await?;
                let stream = ReaderStream::new(file).map(move |chunk| {
                    let _owned = &dir;
                    chunk
                });
                Ok(Body::from_stream(stream))
            }
        }
    }
}

/// Produces export artifacts.
#[derive(Clone)]
pub struct ExportService {
    builder: ReportBuilder,
    document: DocumentRenderer,
    temp_root: Option<PathBuf>,
}

impl ExportService {
    pub fn new(
        builder: ReportBuilder,
        document: DocumentRenderer,
        temp_root: Option<PathBuf>,
    ) -> Self {
        Self {
            builder,
            document,
            temp_root,
        }
    }

    pub fn builder(&self) -> &ReportBuilder {
        &self.builder
    }

    /// Builds and renders one export.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportArtifact, ExportError> {
        let start = Instant::now();
        let format = request.format;

        let result = self.run(request).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(artifact) => {
                record_export(format.as_str(), "success", elapsed);
                info!(
                    format = format.as_str(),
                    filename = %artifact.filename,
                    bytes = artifact.len,
                    duration_ms = (elapsed * 1000.0) as u64,
                    "Report exported"
                );
            }
            Err(e) => {
                record_export(format.as_str(), e.outcome(), elapsed);
                warn!(format = format.as_str(), error = %e, "Report export failed");
            }
        }
        result
    }

    async fn run(&self, request: ExportRequest) -> Result<ExportArtifact, ExportError> {
        let report = self
            .builder
            .build(request.filter, &request.sections)
            .await?;
        let filename =
            artifact_filename(request.format, &request.filter, report.metadata().generated_at);

        let (len, data) = match request.format {
            ExportFormat::Pdf => {
                let bytes = self.document.render(&report).await?;
                (bytes.len() as u64, ArtifactData::Memory(bytes))
            }
            format @ (ExportFormat::Csv | ExportFormat::Xlsx) => {
                let temp_root = self.temp_root.clone();
                let name = filename.clone();
                tokio::task::spawn_blocking(move || {
                    write_archive(format, &report, temp_root.as_deref(), &name)
                })
                .await
                .map_err(|e| ExportError::Task(e.to_string()))??
            }
        };

        Ok(ExportArtifact {
            format: request.format,
            filename,
            len,
            data,
        })
    }
}

/// Renders an archive format into a fresh temporary directory.
///
/// On error the directory is dropped, and with it everything written so far.
fn write_archive(
    format: ExportFormat,
    report: &Report,
    temp_root: Option<&Path>,
    filename: &str,
) -> Result<(u64, ArtifactData), ExportError> {
    let dir = match temp_root {
        Some(root) => tempfile::Builder::new().prefix("report-").tempdir_in(root)?,
        None => tempfile::Builder::new().prefix("report-").tempdir()?,
    };
    let path = dir.path().join(filename);
    let writer = BufWriter::new(File::create(&path)?);

    let writer = match format {
        ExportFormat::Csv => CsvRenderer::new().render_to(report, writer)?,
        _ => SpreadsheetRenderer::new().render_to(report, writer)?,
    };
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    let len = file.metadata()?.len();

    Ok((len, ArtifactData::File { dir, path }))
}
