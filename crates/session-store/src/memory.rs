use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Result, Revision, SessionId, SessionRecord, SessionStoreError,
    store::{SaveOptions, SessionStore},
};

#[derive(Default)]
struct InMemoryState {
    records: HashMap<SessionId, SessionRecord>,
    failing_saves: u32,
    failing_loads: u32,
    save_calls: u32,
}

/// In-memory session store.
///
/// Used by tests and by the API server when no database is configured.
/// Provides the same revision semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemorySessionStore {
    /// Creates a new empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Returns how many times `save` has been called, failures included.
    pub async fn save_calls(&self) -> u32 {
        self.state.read().await.save_calls
    }

    /// Makes the next `count` saves fail with a transient error.
    pub async fn fail_next_saves(&self, count: u32) {
        self.state.write().await.failing_saves = count;
    }

    /// Makes the next `count` loads fail with a transient error.
    pub async fn fail_next_loads(&self, count: u32) {
        self.state.write().await.failing_loads = count;
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, record: SessionRecord, options: SaveOptions) -> Result<Revision> {
        let mut state = self.state.write().await;
        state.save_calls += 1;

        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(SessionStoreError::Unavailable(
                "simulated save failure".to_string(),
            ));
        }

        let session_id = record.session_id;
        let current = state
            .records
            .get(&session_id)
            .map(|r| r.revision)
            .unwrap_or(Revision::initial());

        if let Some(expected) = options.expected_revision
            && current != expected
        {
            return Err(SessionStoreError::RevisionConflict {
                session_id,
                expected,
                actual: current,
            });
        }

        let revision = current.next();
        state.records.insert(
            session_id,
            SessionRecord {
                revision,
                updated_at: Utc::now(),
                ..record
            },
        );

        Ok(revision)
    }

    async fn load(&self, session_id: SessionId) -> Result<Option<SessionRecord>> {
        {
            let mut state = self.state.write().await;
            if state.failing_loads > 0 {
                state.failing_loads -= 1;
                return Err(SessionStoreError::Unavailable(
                    "simulated load failure".to_string(),
                ));
            }
        }

        let state = self.state.read().await;
        Ok(state.records.get(&session_id).cloned())
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<SessionRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .records
            .values()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionStoreExt;

    fn record(session_id: SessionId, customer_id: &str) -> SessionRecord {
        SessionRecord::from_state(
            session_id,
            customer_id,
            "web",
            &serde_json::json!({"stage": "greeting"}),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_new_session_returns_first_revision() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();

        let revision = store
            .save(record(id, "CUST001"), SaveOptions::expect_new())
            .await
            .unwrap();

        assert_eq!(revision, Revision::new(1));
        assert_eq!(store.session_count().await, 1);
        assert!(store.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn load_returns_latest_state() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store
            .save(record(id, "CUST001"), SaveOptions::expect_new())
            .await
            .unwrap();

        let mut updated = record(id, "CUST001");
        updated.state = serde_json::json!({"stage": "cart"});
        let revision = store
            .save(updated, SaveOptions::expect_revision(Revision::new(1)))
            .await
            .unwrap();
        assert_eq!(revision, Revision::new(2));

        let loaded = store.load(id).await.unwrap().unwrap();
        assert_eq!(loaded.revision, Revision::new(2));
        assert_eq!(loaded.state["stage"], "cart");
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store
            .save(record(id, "CUST001"), SaveOptions::expect_new())
            .await
            .unwrap();
        store
            .save(
                record(id, "CUST001"),
                SaveOptions::expect_revision(Revision::new(1)),
            )
            .await
            .unwrap();

        // A second writer that also loaded revision 1
        let result = store
            .save(
                record(id, "CUST001"),
                SaveOptions::expect_revision(Revision::new(1)),
            )
            .await;

        assert!(matches!(
            result,
            Err(SessionStoreError::RevisionConflict { expected, actual, .. })
                if expected == Revision::new(1) && actual == Revision::new(2)
        ));
    }

    #[tokio::test]
    async fn expect_new_rejects_existing_session() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store
            .save(record(id, "CUST001"), SaveOptions::expect_new())
            .await
            .unwrap();

        let result = store
            .save(record(id, "CUST001"), SaveOptions::expect_new())
            .await;
        assert!(matches!(
            result,
            Err(SessionStoreError::RevisionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn unchecked_save_overwrites() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store
            .save(record(id, "CUST001"), SaveOptions::new())
            .await
            .unwrap();
        let revision = store
            .save(record(id, "CUST001"), SaveOptions::new())
            .await
            .unwrap();
        assert_eq!(revision, Revision::new(2));
    }

    #[tokio::test]
    async fn load_unknown_session_returns_none() {
        let store = InMemorySessionStore::new();
        assert!(store.load(SessionId::new()).await.unwrap().is_none());
        assert_eq!(store.current_revision(SessionId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_for_customer_filters_by_customer() {
        let store = InMemorySessionStore::new();
        store
            .save(record(SessionId::new(), "CUST001"), SaveOptions::expect_new())
            .await
            .unwrap();
        store
            .save(record(SessionId::new(), "CUST001"), SaveOptions::expect_new())
            .await
            .unwrap();
        store
            .save(record(SessionId::new(), "CUST002"), SaveOptions::expect_new())
            .await
            .unwrap();

        assert_eq!(store.list_for_customer("CUST001").await.unwrap().len(), 2);
        assert_eq!(store.list_for_customer("CUST002").await.unwrap().len(), 1);
        assert!(store.list_for_customer("CUST404").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn simulated_failures_are_consumed() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store.fail_next_saves(1).await;

        let first = store.save(record(id, "CUST001"), SaveOptions::new()).await;
        assert!(matches!(first, Err(SessionStoreError::Unavailable(_))));

        let second = store.save(record(id, "CUST001"), SaveOptions::new()).await;
        assert!(second.is_ok());
        assert_eq!(store.save_calls().await, 2);
    }
}
