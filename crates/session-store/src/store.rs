use async_trait::async_trait;

use crate::{Result, Revision, SessionId, SessionRecord};

/// Options for saving a session record.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Revision the caller loaded, for optimistic concurrency control.
    /// If None, the save overwrites whatever is stored (last writer wins).
    pub expected_revision: Option<Revision>,
}

impl SaveOptions {
    /// Creates options with no revision check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stored record to be at a specific revision.
    pub fn expect_revision(revision: Revision) -> Self {
        Self {
            expected_revision: Some(revision),
        }
    }

    /// Creates options expecting the session not to exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_revision: Some(Revision::initial()),
        }
    }
}

/// Durable key-value persistence of session state, keyed by session id.
///
/// All implementations must be thread-safe (Send + Sync). Sessions are
/// never deleted.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Saves a session record.
    ///
    /// If `options.expected_revision` is set, the save fails with
    /// `RevisionConflict` when the stored revision differs.
    ///
    /// Returns the new revision of the session.
    async fn save(&self, record: SessionRecord, options: SaveOptions) -> Result<Revision>;

    /// Loads the latest record for a session.
    ///
    /// Returns None if the session has never been saved.
    async fn load(&self, session_id: SessionId) -> Result<Option<SessionRecord>>;

    /// Lists all sessions started for a customer, most recently updated first.
    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<SessionRecord>>;
}

/// Extension trait providing convenience methods for session stores.
#[async_trait]
pub trait SessionStoreExt: SessionStore {
    /// Checks if a session has been persisted.
    async fn exists(&self, session_id: SessionId) -> Result<bool> {
        Ok(self.load(session_id).await?.is_some())
    }

    /// Returns the stored revision of a session, if any.
    async fn current_revision(&self, session_id: SessionId) -> Result<Option<Revision>> {
        Ok(self.load(session_id).await?.map(|record| record.revision))
    }
}

impl<T: SessionStore + ?Sized> SessionStoreExt for T {}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    async fn save(&self, record: SessionRecord, options: SaveOptions) -> Result<Revision> {
        (**self).save(record, options).await
    }

    async fn load(&self, session_id: SessionId) -> Result<Option<SessionRecord>> {
        (**self).load(session_id).await
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<SessionRecord>> {
        (**self).list_for_customer(customer_id).await
    }
}
