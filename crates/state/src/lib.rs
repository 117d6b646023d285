#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Durable per-client cursor state
//!
//! Each client id owns one [`ClientPersistentState`] record holding its wrapped
//! key set, its pagination cursor and the time of its last completed
//! operation. Records are never deleted here; retention is the host's concern.

mod file;
mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
pub use pd_types::{ClientPersistentState, VM_CLIENT_ID};

use async_trait::async_trait;
use pd_errors::Error;

/// Storage for per-client records
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the record for `client_id`, or `None` if it was never written.
    async fn read_state(&self, client_id: &str) -> Result<Option<ClientPersistentState>, Error>;

    /// Replace the record for `client_id`.
    async fn write_state(&self, client_id: &str, state: &ClientPersistentState)
        -> Result<(), Error>;
}

/// Encode a record the way it is stored: JSON, then hex.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn encode_record(state: &ClientPersistentState) -> Result<String, Error> {
    Ok(hex::encode(serde_json::to_vec(state)?))
}

/// Decode a stored record.
///
/// # Errors
///
/// Returns `StorageError::CorruptedData` if the value is not a valid record.
pub fn decode_record(client_id: &str, value: &str) -> Result<ClientPersistentState, Error> {
    let bytes = hex::decode(value).map_err(|e| pd_errors::StorageError::CorruptedData {
        message: format!("record for {client_id} is not hex: {e}"),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        pd_errors::StorageError::CorruptedData {
            message: format!("record for {client_id} is unreadable: {e}"),
        }
        .into()
    })
}
