//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use curio_types::error::{QuotaError, RecommendError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Recommend(RecommendError),
    Quota(QuotaError),
    Validation(String),
}

impl From<RecommendError> for AppError {
    fn from(e: RecommendError) -> Self {
        AppError::Recommend(e)
    }
}

impl From<QuotaError> for AppError {
    fn from(e: QuotaError) -> Self {
        AppError::Quota(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Recommend(RecommendError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Quota(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "QUOTA_STORE_UNAVAILABLE",
                e.to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
