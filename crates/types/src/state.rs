//! Per-client persisted cursor and attestation outcomes

use serde::{Deserialize, Serialize};

/// Reserved id under which the attested environment's public key is stored
pub const VM_CLIENT_ID: &str = "VM_CLIENT";

/// Durable state kept for each client id
///
/// A fresh state has no key set and an empty page token, meaning the next
/// download starts from the beginning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPersistentState {
    /// Master-key wrapped key set. For the `VM_CLIENT` record this is a raw public key.
    #[serde(with = "crate::serde_bytes::option", default, skip_serializing_if = "Option::is_none")]
    pub external_key_set: Option<Vec<u8>>,
    #[serde(with = "crate::serde_bytes", default)]
    pub page_token: Vec<u8>,
    #[serde(default)]
    pub last_completion_time_millis: i64,
}

impl ClientPersistentState {
    #[must_use]
    pub fn has_external_key_set(&self) -> bool {
        self.external_key_set.is_some()
    }

    #[must_use]
    pub fn with_external_key_set(mut self, key_set: Vec<u8>) -> Self {
        self.external_key_set = Some(key_set);
        self
    }

    /// State after a completed operation
    #[must_use]
    pub fn completed(mut self, next_page_token: Option<Vec<u8>>, now_millis: i64) -> Self {
        if let Some(token) = next_page_token {
            self.page_token = token;
        }
        self.last_completion_time_millis = now_millis;
        self
    }
}

/// Result of an attestation attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttestationStatus {
    Success,
    #[default]
    NotRun,
    Failed,
}

impl AttestationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotRun => "not_run",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationOutcome {
    pub status: AttestationStatus,
    #[serde(with = "crate::serde_bytes::option", default)]
    pub token: Option<Vec<u8>>,
}

impl AttestationOutcome {
    #[must_use]
    pub fn success(token: Vec<u8>) -> Self {
        Self {
            status: AttestationStatus::Success,
            token: Some(token),
        }
    }

    #[must_use]
    pub fn not_run() -> Self {
        Self {
            status: AttestationStatus::NotRun,
            token: None,
        }
    }

    #[must_use]
    pub fn failed() -> Self {
        Self {
            status: AttestationStatus::Failed,
            token: None,
        }
    }
}
