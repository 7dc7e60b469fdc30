use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::services::ReportBuildError;
use export::RenderError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited: {message}")]
    RateLimited { message: String, retry_after: u64 },

    #[error("Data fetch error: {0}")]
    DataFetch(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
}

impl ApiError {
    /// Machine-readable error kind written to the `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::DataFetch(_) => "data_fetch_error",
            ApiError::Render(_) => "render_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::DataFetch(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Render(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, retry_after) = match self {
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::Render(msg) => {
                tracing::error!(error = %msg, "Report rendering failed");
                (msg, None)
            }
            ApiError::DataFetch(msg) => {
                tracing::warn!(error = %msg, "Report data unavailable");
                (msg, None)
            }
            ApiError::RateLimited {
                message,
                retry_after,
            } => (message, Some(retry_after)),
            ApiError::Validation(msg) => (msg, None),
        };

        let body = ErrorBody {
            success: false,
            error: message,
            code,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<validator::ValidationError> for ApiError {
    fn from(err: validator::ValidationError) -> Self {
        let message = err
            .message
            .map(|m| m.to_string())
            .unwrap_or_else(|| err.code.to_string());
        ApiError::Validation(message)
    }
}

impl From<ReportBuildError> for ApiError {
    fn from(err: ReportBuildError) -> Self {
        ApiError::DataFetch(err.to_string())
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        ApiError::Render(err.to_string())
    }
}

impl From<domain::services::MetricsError> for ApiError {
    fn from(err: domain::services::MetricsError) -> Self {
        ApiError::DataFetch(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use domain::services::MetricsError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_statuses() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::RateLimited {
                    message: "x".into(),
                    retry_after: 5,
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ApiError::DataFetch("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Render("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_error_codes() {
        let codes = [
            ApiError::Validation("x".into()).code(),
            ApiError::RateLimited {
                message: "x".into(),
                retry_after: 1,
            }
            .code(),
            ApiError::DataFetch("x".into()).code(),
            ApiError::Render("x".into()).code(),
            ApiError::Internal("x".into()).code(),
        ];
        assert_eq!(
            codes,
            [
                "validation_error",
                "rate_limited",
                "data_fetch_error",
                "render_error",
                "internal_error"
            ]
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::Validation("Invalid format. Use one of: csv, pdf, xlsx".into())
            .into_response();
        let body = body_json(response).await;

        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid format. Use one of: csv, pdf, xlsx");
        assert_eq!(body["code"], "validation_error");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited {
            message: "Too many export requests".into(),
            retry_after: 42,
        }
        .into_response();

        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
        assert_eq!(body_json(response).await["code"], "rate_limited");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let body = body_json(ApiError::Internal("pool exploded".into()).into_response()).await;
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_render_error_surfaces_message() {
        let err: ApiError =
            RenderError::InvalidDocument("backend output is not a PDF".into()).into();
        let body = body_json(err.into_response()).await;
        assert!(body["error"].as_str().unwrap().contains("not a PDF"));
        assert_eq!(body["code"], "render_error");
    }

    #[test]
    fn test_from_validation_error_uses_message() {
        let err = shared::validation::validate_export_format("doc").unwrap_err();
        match ApiError::from(err) {
            ApiError::Validation(msg) => assert!(msg.contains("csv, pdf, xlsx")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_build_error_is_data_fetch() {
        let err = ReportBuildError::DataFetch {
            section: "summary",
            source: MetricsError::Unavailable("connection refused".into()),
        };
        match ApiError::from(err) {
            ApiError::DataFetch(msg) => assert!(msg.contains("summary")),
            other => panic!("Expected DataFetch error, got {:?}", other),
        }
    }
}
