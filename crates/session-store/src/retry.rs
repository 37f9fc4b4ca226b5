use std::time::Duration;

use async_trait::async_trait;

use crate::{
    Result, Revision, SessionId, SessionRecord,
    store::{SaveOptions, SessionStore},
};

/// Retry policy for transient store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry. Doubles on each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the given attempts and base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.saturating_sub(1))
    }
}

/// Wraps a session store and retries transient failures with exponential backoff.
///
/// Revision conflicts and serialization errors are returned immediately.
#[derive(Clone)]
pub struct RetryingSessionStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: SessionStore> RetryingSessionStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Gets a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn backoff(&self, operation: &'static str, attempt: u32, error: &crate::SessionStoreError) {
        let delay = self.policy.delay_for(attempt);
        metrics::counter!("session_store_retries_total", "operation" => operation).increment(1);
        tracing::warn!(
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Session store call failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl<S: SessionStore> SessionStore for RetryingSessionStore<S> {
    async fn save(&self, record: SessionRecord, options: SaveOptions) -> Result<Revision> {
        let mut attempt = 1;
        loop {
            match self.inner.save(record.clone(), options).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    self.backoff("save", attempt, &e).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn load(&self, session_id: SessionId) -> Result<Option<SessionRecord>> {
        let mut attempt = 1;
        loop {
            match self.inner.load(session_id).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    self.backoff("load", attempt, &e).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<SessionRecord>> {
        let mut attempt = 1;
        loop {
            match self.inner.list_for_customer(customer_id).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    self.backoff("list_for_customer", attempt, &e).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemorySessionStore, SessionStoreError};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    fn record(session_id: SessionId) -> SessionRecord {
        SessionRecord::from_state(session_id, "CUST001", "web", &serde_json::json!({})).unwrap()
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(50));
        assert_eq!(policy.delay_for(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn transient_save_failure_is_retried() {
        let inner = InMemorySessionStore::new();
        inner.fail_next_saves(2).await;
        let store = RetryingSessionStore::new(inner.clone(), fast_policy());

        let revision = store
            .save(record(SessionId::new()), SaveOptions::expect_new())
            .await
            .unwrap();

        assert_eq!(revision, Revision::new(1));
        assert_eq!(inner.save_calls().await, 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let inner = InMemorySessionStore::new();
        inner.fail_next_saves(5).await;
        let store = RetryingSessionStore::new(inner.clone(), fast_policy());

        let result = store
            .save(record(SessionId::new()), SaveOptions::expect_new())
            .await;

        assert!(matches!(result, Err(SessionStoreError::Unavailable(_))));
        assert_eq!(inner.save_calls().await, 3);
    }

    #[tokio::test]
    async fn conflicts_are_not_retried() {
        let inner = InMemorySessionStore::new();
        let store = RetryingSessionStore::new(inner.clone(), fast_policy());
        let id = SessionId::new();
        store.save(record(id), SaveOptions::expect_new()).await.unwrap();

        let result = store.save(record(id), SaveOptions::expect_new()).await;

        assert!(matches!(
            result,
            Err(SessionStoreError::RevisionConflict { .. })
        ));
        assert_eq!(inner.save_calls().await, 2);
    }

    #[tokio::test]
    async fn transient_load_failure_is_retried() {
        let inner = InMemorySessionStore::new();
        let store = RetryingSessionStore::new(inner.clone(), fast_policy());
        let id = SessionId::new();
        store.save(record(id), SaveOptions::expect_new()).await.unwrap();
        inner.fail_next_loads(1).await;

        let loaded = store.load(id).await.unwrap();
        assert!(loaded.is_some());
    }
}
