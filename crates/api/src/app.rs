use axum::{middleware, routing::get, Router};
use base64::{engine::general_purpose::STANDARD, Engine};
use domain::services::{MetricsSource, ReportBuilder};
use export::{DocumentRenderer, PdfBackend};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::{
        predicate::{DefaultPredicate, NotForContentType, Predicate},
        CompressionLayer,
    },
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id,
    ExportRateLimiter,
};
use crate::routes::{health, reports};
use crate::services::{ExportFormat, ExportService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub metrics_source: Arc<dyn MetricsSource>,
    pub pdf_backend: Arc<dyn PdfBackend>,
    pub exports: ExportService,
    pub rate_limiter: Arc<ExportRateLimiter>,
}

fn logo_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "image/png",
    }
}

/// Reads the header logo into a data URI. An unreadable logo is logged and
/// the report header is rendered without it.
pub fn load_logo(path: Option<&Path>) -> Option<String> {
    let path = path?;
    match std::fs::read(path) {
        Ok(bytes) => {
            info!(path = %path.display(), bytes = bytes.len(), "Loaded report logo");
            Some(format!(
                "data:{};base64,{}",
                logo_mime(path),
                STANDARD.encode(bytes)
            ))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Report logo unavailable");
            None
        }
    }
}

pub fn create_app(
    config: Config,
    metrics_source: Arc<dyn MetricsSource>,
    pdf_backend: Arc<dyn PdfBackend>,
) -> Router {
    let config = Arc::new(config);

    let builder = ReportBuilder::new(metrics_source.clone(), config.export.report_title.clone());
    let document = DocumentRenderer::new(pdf_backend.clone())
        .with_page(config.pdf.page_setup())
        .with_logo(load_logo(config.pdf.logo_path.as_deref()));
    let exports = ExportService::new(builder, document, config.export.temp_dir.clone());

    let rate_limiter = Arc::new(ExportRateLimiter::new(
        config.export.rate_limit_per_window,
        config.export.rate_window(),
    ));

    let state = AppState {
        config: config.clone(),
        metrics_source,
        pdf_backend,
        exports,
        rate_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let report_routes = Router::new()
        .route("/api/v1/reports/export", get(reports::export_report))
        .route("/api/v1/reports/sections", get(reports::list_sections))
        .route("/api/v1/reports/filters", get(reports::list_filters));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(report_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

/// Compress API responses but not export artifacts, which are zip archives
/// or PDFs already and carry an exact `Content-Length`.
fn compression_predicate() -> impl Predicate {
    DefaultPredicate::new()
        .and(NotForContentType::new(ExportFormat::Csv.content_type()))
        .and(NotForContentType::new(ExportFormat::Pdf.content_type()))
        .and(NotForContentType::new(ExportFormat::Xlsx.content_type()))
}
