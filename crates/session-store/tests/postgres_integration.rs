//! PostgreSQL integration tests
//!
//! These tests start a shared PostgreSQL container and need Docker.
//! Run with:
//!
//! ```bash
//! cargo test -p session-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use serial_test::serial;
use session_store::{
    PostgresSessionStore, Revision, SaveOptions, SessionId, SessionRecord, SessionStore,
    SessionStoreError, SessionStoreExt,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_sessions_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty sessions table
async fn get_test_store() -> PostgresSessionStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE sessions")
        .execute(&pool)
        .await
        .unwrap();

    PostgresSessionStore::new(pool)
}

fn create_record(session_id: SessionId, customer_id: &str, stage: &str) -> SessionRecord {
    SessionRecord::from_state(
        session_id,
        customer_id,
        "web",
        &serde_json::json!({"stage": stage, "cart": []}),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn save_and_load_session() {
    let store = get_test_store().await;
    let id = SessionId::new();

    let revision = store
        .save(create_record(id, "CUST001", "greeting"), SaveOptions::expect_new())
        .await
        .unwrap();
    assert_eq!(revision, Revision::new(1));

    let loaded = store.load(id).await.unwrap().unwrap();
    assert_eq!(loaded.customer_id, "CUST001");
    assert_eq!(loaded.revision, Revision::new(1));
    assert_eq!(loaded.state["stage"], "greeting");
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn update_bumps_revision() {
    let store = get_test_store().await;
    let id = SessionId::new();

    store
        .save(create_record(id, "CUST001", "greeting"), SaveOptions::expect_new())
        .await
        .unwrap();
    let revision = store
        .save(
            create_record(id, "CUST001", "cart"),
            SaveOptions::expect_revision(Revision::new(1)),
        )
        .await
        .unwrap();

    assert_eq!(revision, Revision::new(2));
    assert_eq!(store.current_revision(id).await.unwrap(), Some(Revision::new(2)));
    let loaded = store.load(id).await.unwrap().unwrap();
    assert_eq!(loaded.state["stage"], "cart");
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn stale_revision_conflicts() {
    let store = get_test_store().await;
    let id = SessionId::new();

    store
        .save(create_record(id, "CUST001", "greeting"), SaveOptions::expect_new())
        .await
        .unwrap();
    store
        .save(
            create_record(id, "CUST001", "browsing"),
            SaveOptions::expect_revision(Revision::new(1)),
        )
        .await
        .unwrap();

    let result = store
        .save(
            create_record(id, "CUST001", "cart"),
            SaveOptions::expect_revision(Revision::new(1)),
        )
        .await;

    assert!(matches!(
        result,
        Err(SessionStoreError::RevisionConflict { .. })
    ));
    let loaded = store.load(id).await.unwrap().unwrap();
    assert_eq!(loaded.state["stage"], "browsing");
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn list_sessions_for_customer() {
    let store = get_test_store().await;

    for customer in ["CUST001", "CUST001", "CUST002"] {
        store
            .save(
                create_record(SessionId::new(), customer, "greeting"),
                SaveOptions::expect_new(),
            )
            .await
            .unwrap();
    }

    assert_eq!(store.list_for_customer("CUST001").await.unwrap().len(), 2);
    assert_eq!(store.list_for_customer("CUST002").await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn unknown_session_loads_none() {
    let store = get_test_store().await;
    assert!(!store.exists(SessionId::new()).await.unwrap());
}
