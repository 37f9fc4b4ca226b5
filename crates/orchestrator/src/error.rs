//! Orchestrator error types.

use capabilities::CapabilityError;
use common::SessionId;
use domain::DomainError;
use session_store::SessionStoreError;
use thiserror::Error;

/// Errors returned by the conversation service.
///
/// Business outcomes the customer can act on (declined payment, invalid
/// promo code, out of stock during chat) are not errors; they come back as
/// an unsuccessful [`crate::AgentResponse`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No session has been saved under this id.
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Another request saved the session after this one loaded it.
    #[error("Session {0} was modified concurrently, reload and retry")]
    Conflict(SessionId),

    /// The request was malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Capability error.
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Session store error.
    #[error("Session store error: {0}")]
    Store(SessionStoreError),

    /// The stored session could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<SessionStoreError> for ServiceError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::RevisionConflict { session_id, .. } => {
                ServiceError::Conflict(session_id)
            }
            other => ServiceError::Store(other),
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::Revision;

    #[test]
    fn revision_conflict_becomes_conflict() {
        let session_id = SessionId::new();
        let err: ServiceError = SessionStoreError::RevisionConflict {
            session_id,
            expected: Revision::new(1),
            actual: Revision::new(2),
        }
        .into();
        assert!(matches!(err, ServiceError::Conflict(id) if id == session_id));
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err: ServiceError = SessionStoreError::Unavailable("down".to_string()).into();
        assert!(matches!(err, ServiceError::Store(SessionStoreError::Unavailable(_))));
    }
}
