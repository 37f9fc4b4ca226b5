use thiserror::Error;

use crate::{Revision, SessionId};

/// Errors that can occur when interacting with the session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Another writer saved the session after it was loaded.
    #[error(
        "Revision conflict for session {session_id}: expected revision {expected}, found {actual}"
    )]
    RevisionConflict {
        session_id: SessionId,
        expected: Revision,
        actual: Revision,
    },

    /// The backing store could not be reached.
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionStoreError {
    /// Returns true if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SessionStoreError::Unavailable(_) => true,
            SessionStoreError::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_transient() {
        assert!(SessionStoreError::Unavailable("down".to_string()).is_transient());
        assert!(SessionStoreError::Database(sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn conflicts_and_bad_payloads_are_not_transient() {
        let conflict = SessionStoreError::RevisionConflict {
            session_id: SessionId::new(),
            expected: Revision::new(1),
            actual: Revision::new(2),
        };
        assert!(!conflict.is_transient());

        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!SessionStoreError::Serialization(bad_json).is_transient());
        assert!(!SessionStoreError::Database(sqlx::Error::RowNotFound).is_transient());
    }
}
