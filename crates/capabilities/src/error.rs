//! Capability error types.

use domain::DomainError;
use thiserror::Error;

/// Errors returned by the retail data-service client.
#[derive(Debug, Error)]
pub enum RetailApiError {
    /// The service could not be reached, timed out, or failed internally.
    #[error("Retail data service unavailable: {0}")]
    Unavailable(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service rejected the request (declined payment, invalid promo, ...).
    #[error("Rejected ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        error_code: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Errors returned by worker capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The request failed local validation; nothing was sent downstream.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced product, customer or order does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A business rule rejected the request.
    #[error("{message}")]
    Rejected {
        message: String,
        error_code: Option<String>,
    },

    /// A downstream dependency failed.
    #[error("Downstream unavailable: {0}")]
    Unavailable(String),
}

impl From<RetailApiError> for CapabilityError {
    fn from(err: RetailApiError) -> Self {
        match err {
            RetailApiError::NotFound(what) => CapabilityError::NotFound(what),
            RetailApiError::Rejected {
                message,
                error_code,
                ..
            } => CapabilityError::Rejected {
                message,
                error_code,
            },
            RetailApiError::Unavailable(msg) | RetailApiError::Decode(msg) => {
                CapabilityError::Unavailable(msg)
            }
        }
    }
}

impl From<DomainError> for CapabilityError {
    fn from(err: DomainError) -> Self {
        CapabilityError::Validation(err.to_string())
    }
}

/// Convenience type alias for capability results.
pub type Result<T> = std::result::Result<T, CapabilityError>;
