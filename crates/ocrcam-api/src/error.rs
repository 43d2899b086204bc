//! API error types and JSON error response formatting.
//!
//! ApiError gives every endpoint the same JSON error body, mapping internal
//! errors to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use ocrcam_core::error::OcrCamError;
use ocrcam_poll::StartRefusal;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "conflict", "service_unavailable").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request.
    BadRequest(String),
    /// 409 Conflict - polling already in the requested state.
    Conflict(String),
    /// 500 Internal Server Error.
    Internal(String),
    /// 503 Service Unavailable - pool or camera not ready.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<OcrCamError> for ApiError {
    fn from(err: OcrCamError) -> Self {
        match &err {
            OcrCamError::CameraUnavailable
            | OcrCamError::PoolNotReady
            | OcrCamError::PoolClosed
            | OcrCamError::QueueFull { .. } => ApiError::ServiceUnavailable(err.to_string()),
            OcrCamError::Config(_) | OcrCamError::InvalidRegion { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StartRefusal> for ApiError {
    fn from(refusal: StartRefusal) -> Self {
        match refusal {
            StartRefusal::PoolNotReady => {
                ApiError::ServiceUnavailable("Recognition pool is not ready".to_string())
            }
            StartRefusal::AlreadyRunning => {
                ApiError::Conflict("Polling is already running".to_string())
            }
        }
    }
}
