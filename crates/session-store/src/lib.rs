//! Versioned persistence for conversation sessions.
//!
//! A session is stored as one [`SessionRecord`]: the identifying columns
//! (session, customer, channel) plus an opaque JSON state blob and a
//! [`Revision`] used to detect lost updates between concurrent writers.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod retry;
pub mod store;

pub use common::{Revision, SessionId};
pub use error::{Result, SessionStoreError};
pub use memory::InMemorySessionStore;
pub use postgres::PostgresSessionStore;
pub use record::SessionRecord;
pub use retry::{RetryPolicy, RetryingSessionStore};
pub use store::{SaveOptions, SessionStore, SessionStoreExt};
