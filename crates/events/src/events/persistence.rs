use serde::{Deserialize, Serialize};

/// Cursor state lifecycle for a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PersistenceEvent {
    /// An existing record was read
    StateLoaded { client_id: String },

    /// No record existed and a default one was created in memory
    StateCreated { client_id: String },

    /// The updated record was written
    StateCommitted {
        client_id: String,
        page_token_advanced: bool,
    },
}
