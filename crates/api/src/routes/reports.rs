//! Report export endpoint handlers.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Query;
use domain::models::{FilterOptions, ReportFilter, SectionInfo};
use serde::{Deserialize, Serialize};
use shared::validation::{
    parse_iso_date, validate_date_order, validate_date_span, validate_positive_id,
};
use tracing::debug;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ClientId;
use crate::services::export::{ExportFormat, ExportRequest};

/// Raw export query. Everything arrives as text so that malformed values are
/// reported through the same validation errors as missing ones.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Repeated (`sections=a&sections=b`) or comma-separated.
    #[serde(default)]
    pub sections: Vec<String>,
    pub entity_id: Option<String>,
    pub technician_id: Option<String>,
}

/// Successful JSON payload wrapper.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{} is required", field)))
}

fn optional_id(value: &Option<String>, field: &str) -> Result<Option<i64>, ApiError> {
    let Some(raw) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let id = raw
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("{} must be a positive integer", field)))?;
    validate_positive_id(id)
        .map_err(|_| ApiError::Validation(format!("{} must be a positive integer", field)))?;
    Ok(Some(id))
}

fn split_sections(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validates an export query, in order: format, dates, date order, span, identifiers.
pub fn parse_export_request(
    query: &ExportQuery,
    max_span_months: u32,
) -> Result<ExportRequest, ApiError> {
    let format = ExportFormat::parse(query.format.as_deref().unwrap_or_default())?;

    let date_from = parse_iso_date("date_from", required(&query.date_from, "date_from")?)?;
    let date_to = parse_iso_date("date_to", required(&query.date_to, "date_to")?)?;
    validate_date_order(date_from, date_to)?;
    validate_date_span(date_from, date_to, max_span_months)?;

    let entity_id = optional_id(&query.entity_id, "entity_id")?;
    let technician_id = optional_id(&query.technician_id, "technician_id")?;

    Ok(ExportRequest {
        format,
        filter: ReportFilter {
            date_from: Some(date_from),
            date_to: Some(date_to),
            entity_id,
            technician_id,
        },
        sections: split_sections(&query.sections),
    })
}

/// Export a report.
///
/// GET /api/v1/reports/export
pub async fn export_report(
    State(state): State<AppState>,
    client: ClientId,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let request = parse_export_request(&query, state.config.export.max_span_months)?;
    state.rate_limiter.guard(client.as_str())?;

    debug!(
        client = %client.as_str(),
        format = request.format.as_str(),
        sections = request.sections.len(),
        "Export requested"
    );

    let artifact = state.exports.export(request).await?;
    let content_type = artifact.content_type();
    let len = artifact.len;
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    let body = artifact.into_body().await?;

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::Internal(format!("Invalid filename header: {}", e)))?,
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    Ok(response)
}

/// List the report sections that can be requested.
///
/// GET /api/v1/reports/sections
pub async fn list_sections() -> Json<DataResponse<Vec<SectionInfo>>> {
    DataResponse::ok(SectionInfo::catalogue())
}

/// Entities and technicians available as export filters.
///
/// GET /api/v1/reports/filters
pub async fn list_filters(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<FilterOptions>>, ApiError> {
    let options = state.exports.builder().filter_options().await?;
    Ok(DataResponse::ok(options))
}
