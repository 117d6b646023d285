//! Per-client key lifecycle

use crate::keyset::KeySet;
use crate::master::MasterKeyProvider;
use pd_errors::{CryptoError, Error};
use pd_state::{StateStore, VM_CLIENT_ID};
use pd_types::{ClientPersistentState, ClientVersionType};
use std::sync::Arc;

/// Key obtained for one operation, together with the state it must be
/// persisted with
#[derive(Debug, Clone)]
pub struct ObtainedKey {
    pub key_set: KeySet,
    pub state: ClientPersistentState,
    /// True when the key set was generated by this call
    pub generated: bool,
}

/// Resolves the key a client's payloads are encrypted to
///
/// The manager reads the attested environment record but never writes
/// storage; a freshly generated key set is merged into the returned state and
/// becomes durable only when the caller persists that state.
pub struct KeyManager {
    master_keys: Arc<dyn MasterKeyProvider>,
    store: Arc<dyn StateStore>,
}

impl KeyManager {
    pub fn new(master_keys: Arc<dyn MasterKeyProvider>, store: Arc<dyn StateStore>) -> Self {
        Self { master_keys, store }
    }

    #[must_use]
    pub fn master_keys(&self) -> &dyn MasterKeyProvider {
        self.master_keys.as_ref()
    }

    /// Obtain the key for `client_id`.
    ///
    /// Attested clients use the provisioned public key stored under
    /// [`VM_CLIENT_ID`]. Other clients reload the key set from `state`, or get
    /// a new one merged into the returned state.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NoKeyAvailable` if an attested client asks for a
    /// key before one is provisioned, and crypto or storage errors otherwise.
    pub async fn obtain_key(
        &self,
        client_id: &str,
        version_type: ClientVersionType,
        state: ClientPersistentState,
    ) -> Result<ObtainedKey, Error> {
        if version_type.is_attested() {
            let key_set = self.attested_environment_key().await?;
            tracing::info!(
                client_id,
                key_hash = %key_set.public_key_hash_for_logging(),
                "using attested environment public key"
            );
            return Ok(ObtainedKey {
                key_set,
                state,
                generated: false,
            });
        }

        if let Some(wrapped) = state.external_key_set.as_deref() {
            let master = self.master_keys.read_or_generate().await?;
            let key_set = KeySet::from_encrypted_key_set(wrapped, &master)?;
            tracing::debug!(
                client_id,
                key_hash = %key_set.public_key_hash_for_logging(),
                "reloaded key set"
            );
            return Ok(ObtainedKey {
                key_set,
                state,
                generated: false,
            });
        }

        let key_set = KeySet::generate();
        let master = self.master_keys.read_or_generate().await?;
        let wrapped = key_set.to_encrypted_key_set(&master)?;
        tracing::info!(
            client_id,
            key_hash = %key_set.public_key_hash_for_logging(),
            "generated new key set for a new client state"
        );
        Ok(ObtainedKey {
            key_set,
            state: state.with_external_key_set(wrapped),
            generated: true,
        })
    }

    /// The provisioned attested environment key, public half only.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::NoKeyAvailable` if nothing was provisioned.
    pub async fn attested_environment_key(&self) -> Result<KeySet, Error> {
        let record = self.store.read_state(VM_CLIENT_ID).await?;
        let public_key = record
            .and_then(|r| r.external_key_set)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CryptoError::NoKeyAvailable {
                client_id: VM_CLIENT_ID.to_string(),
            })?;
        Ok(KeySet::from_public_key(&public_key)?)
    }
}
