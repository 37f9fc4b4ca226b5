use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Revision, SessionId};

/// A persisted session: identifying columns plus the serialized state blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The session this record belongs to.
    pub session_id: SessionId,

    /// Customer the session was started for.
    pub customer_id: String,

    /// Channel the conversation is currently on (web, mobile, store, ...).
    pub channel: String,

    /// Revision of this record. Assigned by the store on save.
    pub revision: Revision,

    /// When the record was last written.
    pub updated_at: DateTime<Utc>,

    /// The serialized session state.
    pub state: serde_json::Value,
}

impl SessionRecord {
    /// Creates a record from a serializable state.
    ///
    /// The revision is left at [`Revision::initial`]; the store assigns the
    /// real revision when the record is saved.
    pub fn from_state<T: Serialize>(
        session_id: SessionId,
        customer_id: impl Into<String>,
        channel: impl Into<String>,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            session_id,
            customer_id: customer_id.into(),
            channel: channel.into(),
            revision: Revision::initial(),
            updated_at: Utc::now(),
            state: serde_json::to_value(state)?,
        })
    }

    /// Deserializes the state blob into a typed value.
    pub fn state_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state.clone())
    }
}
