use crate::{ClientPersistentState, StateStore};
use async_trait::async_trait;
use pd_errors::Error;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-process store, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: RwLock<HashMap<String, ClientPersistentState>>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored record
    pub async fn snapshot(&self) -> HashMap<String, ClientPersistentState> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn read_state(&self, client_id: &str) -> Result<Option<ClientPersistentState>, Error> {
        Ok(self.records.read().await.get(client_id).cloned())
    }

    async fn write_state(
        &self,
        client_id: &str,
        state: &ClientPersistentState,
    ) -> Result<(), Error> {
        self.records
            .write()
            .await
            .insert(client_id.to_string(), state.clone());
        Ok(())
    }
}
