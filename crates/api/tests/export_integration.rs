//! Integration tests for the report export endpoints.
//!
//! Run with: cargo test --test export_integration

mod common;

use axum::http::{header, HeaderValue, StatusCode};
use common::{
    body_bytes, create_test_app, default_test_app, get_request, get_request_from,
    parse_response_body, test_config, test_config_with, zip_entry_names, zip_entry_text,
    StubPdfBackend,
};
use domain::services::MockMetricsSource;
use tower::ServiceExt;

const CSV_EXPORT: &str =
    "/api/v1/reports/export?format=csv&date_from=2024-01-01&date_to=2024-01-31&sections=summary,status_breakdown";

fn export_uri(format: &str) -> String {
    format!(
        "/api/v1/reports/export?format={}&date_from=2024-01-01&date_to=2024-01-31",
        format
    )
}

// ============================================================================
// Successful exports
// ============================================================================

#[tokio::test]
async fn test_csv_export_returns_zip_with_requested_sections() {
    let app = default_test_app();

    let response = app.router.clone().oneshot(get_request(CSV_EXPORT)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"report_20240101_20240131_"));
    assert!(disposition.ends_with(".zip\""));

    let declared: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let bytes = body_bytes(response).await;
    assert_eq!(bytes.len(), declared);

    assert_eq!(
        zip_entry_names(&bytes),
        vec!["00_metadata.csv", "01_summary.csv", "02_chamados_status.csv"]
    );
    let metadata = zip_entry_text(&bytes, "00_metadata.csv");
    assert!(metadata.starts_with('\u{feff}'));
    assert!(metadata.contains("Period;2024-01-01 to 2024-01-31\n"));
}

#[tokio::test]
async fn test_export_sets_no_cache_headers() {
    let app = default_test_app();

    let response = app.router.clone().oneshot(get_request(CSV_EXPORT)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, must-revalidate");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_xlsx_export() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request(&export_uri("xlsx")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let bytes = body_bytes(response).await;
    let names = zip_entry_names(&bytes);
    assert_eq!(names[0], "[Content_Types].xml");
    assert!(names.iter().any(|n| n == "xl/workbook.xml"));
    assert!(names.iter().any(|n| n == "xl/worksheets/sheet1.xml"));
}

#[tokio::test]
async fn test_pdf_export_goes_through_backend() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request(&format!("{}&sections=overdue_tickets", export_uri("PDF"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(body_bytes(response).await, StubPdfBackend::DOCUMENT);
    assert_eq!(app.pdf.renders(), 1);
}

#[tokio::test]
async fn test_csv_temp_directory_removed_after_download() {
    let root = tempfile::tempdir().unwrap();
    let config = test_config_with(&[("export.temp_dir", root.path().to_str().unwrap())]);
    let app = create_test_app(config, MockMetricsSource::new(), StubPdfBackend::default());

    let response = app.router.clone().oneshot(get_request(CSV_EXPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);

    body_bytes(response).await;
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_zip_export_is_not_recompressed() {
    let app = default_test_app();
    let mut request = get_request(CSV_EXPORT);
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    let declared: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let bytes = body_bytes(response).await;
    assert_eq!(bytes.len(), declared);
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_json_responses_are_still_compressed() {
    let app = default_test_app();
    let mut request = get_request("/api/v1/reports/sections");
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
}

// ============================================================================
// Validation and failures
// ============================================================================

#[tokio::test]
async fn test_reversed_dates_rejected_before_fetching() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            "/api/v1/reports/export?format=csv&date_from=2024-02-01&date_to=2024-01-01",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(app.source.calls(), 0);
}

#[tokio::test]
async fn test_unsupported_format_rejected() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request(&export_uri("docx")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("csv, pdf, xlsx"));
}

#[tokio::test]
async fn test_span_longer_than_limit_rejected() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            "/api/v1/reports/export?format=csv&date_from=2023-01-01&date_to=2024-06-30",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.source.calls(), 0);
}

#[tokio::test]
async fn test_span_of_twelve_months_and_some_days_accepted() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request(
            "/api/v1/reports/export?format=csv&date_from=2023-01-15&date_to=2024-01-20",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failing_source_returns_service_unavailable() {
    let app = create_test_app(
        test_config(),
        MockMetricsSource::failing(),
        StubPdfBackend::default(),
    );

    let response = app.router.clone().oneshot(get_request(CSV_EXPORT)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], "data_fetch_error");
}

#[tokio::test]
async fn test_pdf_backend_failure_is_render_error() {
    let app = create_test_app(
        test_config(),
        MockMetricsSource::new(),
        StubPdfBackend::unavailable(),
    );

    let response = app
        .router
        .clone()
        .oneshot(get_request(&export_uri("pdf")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], "render_error");
}

// ============================================================================
// Rate guard
// ============================================================================

#[tokio::test]
async fn test_eleventh_export_in_window_is_rejected() {
    let app = default_test_app();

    for i in 0..10 {
        let response = app
            .router
            .clone()
            .oneshot(get_request_from(CSV_EXPORT, "198.51.100.20"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {}", i + 1);
    }

    let response = app
        .router
        .clone()
        .oneshot(get_request_from(CSV_EXPORT, "198.51.100.20"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], "rate_limited");

    // Other clients keep their own budget.
    let response = app
        .router
        .clone()
        .oneshot(get_request_from(CSV_EXPORT, "198.51.100.21"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_requests_do_not_consume_budget() {
    let config = test_config_with(&[("export.rate_limit_per_window", "1")]);
    let app = create_test_app(config, MockMetricsSource::new(), StubPdfBackend::default());

    let response = app
        .router
        .clone()
        .oneshot(get_request(&export_uri("rtf")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.router.clone().oneshot(get_request(CSV_EXPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.router.clone().oneshot(get_request(CSV_EXPORT)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// ============================================================================
// Catalogue endpoints
// ============================================================================

#[tokio::test]
async fn test_list_sections() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/v1/reports/sections"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["success"], true);
    let sections = body["data"].as_array().unwrap();
    assert_eq!(sections.len(), 10);
    assert_eq!(sections[0]["id"], "summary");
    assert_eq!(sections[8]["id"], "overdue_tickets");
}

#[tokio::test]
async fn test_list_filters() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/v1/reports/filters"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert!(!body["data"]["entities"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["technicians"][0]["name"], "Ana Souza");
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_degraded_pdf_backend() {
    let app = create_test_app(
        test_config(),
        MockMetricsSource::new(),
        StubPdfBackend::unavailable(),
    );

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"]["connected"], true);
    assert_eq!(body["pdf_backend"]["available"], false);
}

#[tokio::test]
async fn test_ready_fails_without_database() {
    let app = create_test_app(
        test_config(),
        MockMetricsSource::failing(),
        StubPdfBackend::default(),
    );

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/health/ready"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/health/live"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
