use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, Revision, SessionId, SessionRecord, SessionStoreError,
    store::{SaveOptions, SessionStore},
};

/// PostgreSQL-backed session store implementation.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Creates a new PostgreSQL session store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url` and wraps the pool.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<SessionRecord> {
        Ok(SessionRecord {
            session_id: SessionId::from_uuid(row.try_get::<Uuid, _>("session_id")?),
            customer_id: row.try_get("customer_id")?,
            channel: row.try_get("channel")?,
            revision: Revision::new(row.try_get("revision")?),
            updated_at: row.try_get("updated_at")?,
            state: row.try_get("state")?,
        })
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn save(&self, record: SessionRecord, options: SaveOptions) -> Result<Revision> {
        let session_id = record.session_id;

        let mut tx = self.pool.begin().await?;

        // Lock the row so concurrent writers serialize on it
        let current: Option<i64> =
            sqlx::query_scalar("SELECT revision FROM sessions WHERE session_id = $1 FOR UPDATE")
                .bind(session_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let actual = Revision::new(current.unwrap_or(0));

        if let Some(expected) = options.expected_revision
            && actual != expected
        {
            return Err(SessionStoreError::RevisionConflict {
                session_id,
                expected,
                actual,
            });
        }

        let revision = actual.next();

        let result = if current.is_some() {
            sqlx::query(
                r#"
                UPDATE sessions
                SET customer_id = $2, channel = $3, revision = $4, state = $5, updated_at = NOW()
                WHERE session_id = $1
                "#,
            )
            .bind(session_id.as_uuid())
            .bind(&record.customer_id)
            .bind(&record.channel)
            .bind(revision.as_i64())
            .bind(&record.state)
            .execute(&mut *tx)
            .await
        } else {
            sqlx::query(
                r#"
                INSERT INTO sessions (session_id, customer_id, channel, revision, state, updated_at)
                VALUES ($1, $2, $3, $4, $5, NOW())
                "#,
            )
            .bind(session_id.as_uuid())
            .bind(&record.customer_id)
            .bind(&record.channel)
            .bind(revision.as_i64())
            .bind(&record.state)
            .execute(&mut *tx)
            .await
        };

        result.map_err(|e| {
            // Two first saves raced past the empty SELECT
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return SessionStoreError::RevisionConflict {
                    session_id,
                    expected: options.expected_revision.unwrap_or(Revision::initial()),
                    actual: revision,
                };
            }
            SessionStoreError::Database(e)
        })?;

        tx.commit().await?;
        Ok(revision)
    }

    async fn load(&self, session_id: SessionId) -> Result<Option<SessionRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT session_id, customer_id, channel, revision, state, updated_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<SessionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT session_id, customer_id, channel, revision, state, updated_at
            FROM sessions
            WHERE customer_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
