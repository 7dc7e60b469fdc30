//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub pdf_backend: BackendHealth,
}

/// Metrics database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// PDF backend health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// The service is healthy when the metrics database answers. An unreachable
/// PDF backend is reported but only degrades PDF exports.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let start = std::time::Instant::now();
    let db_connected = state.metrics_source.ping().await.is_ok();
    let latency_ms = start.elapsed().as_millis() as u64;

    let pdf_backend = match state.pdf_backend.health().await {
        Ok(()) => BackendHealth {
            available: true,
            error: None,
        },
        Err(e) => BackendHealth {
            available: false,
            error: Some(e.to_string()),
        },
    };

    let status = match (db_connected, pdf_backend.available) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected: db_connected,
            latency_ms: if db_connected { Some(latency_ms) } else { None },
        },
        pdf_backend,
    };

    if db_connected {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the metrics database can be queried.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if state.metrics_source.ping().await.is_ok() {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "degraded".to_string(),
            version: "0.1.0".to_string(),
            database: DatabaseHealth {
                connected: true,
                latency_ms: Some(5),
            },
            pdf_backend: BackendHealth {
                available: false,
                error: Some("PDF backend timed out".to_string()),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["database"]["latency_ms"], 5);
        assert_eq!(json["pdf_backend"]["available"], false);
        assert_eq!(json["pdf_backend"]["error"], "PDF backend timed out");
    }

    #[test]
    fn test_backend_health_omits_missing_error() {
        let json = serde_json::to_string(&BackendHealth {
            available: true,
            error: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"available":true}"#);
    }

    #[tokio::test]
    async fn test_live() {
        assert_eq!(live().await.0.status, "alive");
    }
}
