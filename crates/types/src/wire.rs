//! Schema spoken to the remote distribution service
//!
//! Field names follow the service's JSON mapping (lower camel case). Proof and
//! component shapes are shared with the caller-facing schema in [`crate::api`].

use crate::api::{DownloadMode, DownloadStatus, ProtectionComponent, ProtectionProof};
use crate::client::ClientVersionType;
use crate::labels::Label;
use crate::state::AttestationStatus;
use serde::{Deserialize, Serialize};

/// Attestation evidence attached to every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityResponse {
    pub status: AttestationStatus,
    /// Empty unless attestation succeeded
    #[serde(with = "crate::serde_bytes", default)]
    pub attestation_token: Vec<u8>,
    /// Content-binding hash the token was requested for
    #[serde(default)]
    pub content_binding: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKeys {
    #[serde(with = "crate::serde_bytes")]
    pub public_key: Vec<u8>,
    pub use_client_id_seed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientVersion {
    #[serde(rename = "type")]
    pub kind: ClientVersionType,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobConstraints {
    pub client_id: String,
    pub device_tier: String,
    pub client_version: ClientVersion,
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Reserved for server-side counters; always sent empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub crypto_keys: CryptoKeys,
    pub blob_constraints: BlobConstraints,
    #[serde(default)]
    pub counters: Counters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionProofConfig {
    pub include_v2_proof: bool,
    pub exclude_v1_proof: bool,
}

impl Default for ProtectionProofConfig {
    fn default() -> Self {
        Self {
            include_v2_proof: true,
            exclude_v1_proof: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBlobRequest {
    pub integrity_response: IntegrityResponse,
    pub metadata: Metadata,
    #[serde(with = "crate::serde_bytes", default)]
    pub page_token: Vec<u8>,
    #[serde(default)]
    pub download_mode: DownloadMode,
    #[serde(default)]
    pub protection_proof_config: ProtectionProofConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBlobResponse {
    #[serde(with = "crate::serde_bytes", default)]
    pub blob: Vec<u8>,
    #[serde(default)]
    pub protection_components: Vec<ProtectionComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_proof_v2: Option<ProtectionProof>,
    #[serde(with = "crate::serde_bytes", default)]
    pub next_page_token: Vec<u8>,
    #[serde(default)]
    pub download_status: DownloadStatus,
    #[serde(with = "crate::serde_bytes", default)]
    pub protection_token: Vec<u8>,
}

impl DownloadBlobResponse {
    /// Close approximation of the bytes received for this response
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        serialized_len(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetManifestConfigRequest {
    pub integrity_response: IntegrityResponse,
    pub metadata: Metadata,
    #[serde(default)]
    pub compress_manifest: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetManifestConfigResponse {
    #[serde(with = "crate::serde_bytes", default)]
    pub encrypted_manifest_config: Vec<u8>,
    /// Set when the plaintext under the encryption is zlib-deflated
    #[serde(default)]
    pub is_compressed: bool,
}

impl GetManifestConfigResponse {
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        serialized_len(self)
    }
}

fn serialized_len<T: Serialize>(value: &T) -> usize {
    serde_json::to_vec(value).map_or(0, |bytes| bytes.len())
}
