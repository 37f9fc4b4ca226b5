//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use capabilities::CapabilityError;
use orchestrator::ServiceError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Conversation service error.
    Service(ServiceError),
    /// Capability called directly by a route.
    Capability(CapabilityError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => service_error_to_response(err),
            ApiError::Capability(err) => capability_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    match err {
        ServiceError::SessionNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        ServiceError::Validation(_) | ServiceError::Domain(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ServiceError::Capability(inner) => capability_error_to_response(inner),
        ServiceError::Store(_) | ServiceError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn capability_error_to_response(err: CapabilityError) -> (StatusCode, String) {
    match &err {
        CapabilityError::Validation(_) | CapabilityError::Rejected { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CapabilityError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CapabilityError::Unavailable(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<CapabilityError> for ApiError {
    fn from(err: CapabilityError) -> Self {
        ApiError::Capability(err)
    }
}
