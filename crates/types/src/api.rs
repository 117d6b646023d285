//! Request and response types exposed to callers of the engine

use crate::client::{Client, ClientVersion};
use crate::labels::{ClientGroup, DeviceTier, Variant};
use serde::{Deserialize, Serialize};

/// What is being requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobConstraints {
    pub client: Client,
    #[serde(default)]
    pub client_group: ClientGroup,
    #[serde(default)]
    pub device_tier: DeviceTier,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub client_version: ClientVersion,
}

impl BlobConstraints {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            client_group: ClientGroup::default(),
            device_tier: DeviceTier::default(),
            variant: Variant::default(),
            client_version: ClientVersion::default(),
        }
    }

    #[must_use]
    pub fn with_client_group(mut self, client_group: ClientGroup) -> Self {
        self.client_group = client_group;
        self
    }

    #[must_use]
    pub fn with_device_tier(mut self, device_tier: DeviceTier) -> Self {
        self.device_tier = device_tier;
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub fn with_client_version(mut self, client_version: ClientVersion) -> Self {
        self.client_version = client_version;
        self
    }
}

/// Key material supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoKeys {
    /// Public key payloads are re-encrypted to
    #[serde(with = "crate::serde_bytes", default)]
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub blob_constraints: BlobConstraints,
    #[serde(default)]
    pub crypto_keys: CryptoKeys,
}

/// Scheduling hint forwarded to the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadMode {
    #[default]
    Unspecified,
    Foreground,
    Background,
}

impl clap::ValueEnum for DownloadMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Unspecified, Self::Foreground, Self::Background]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Unspecified => clap::builder::PossibleValue::new("unspecified"),
            Self::Foreground => clap::builder::PossibleValue::new("foreground"),
            Self::Background => clap::builder::PossibleValue::new("background"),
        })
    }
}

/// Request to download the next blob for a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBlobRequest {
    pub api_key: String,
    pub metadata: Metadata,
    /// Informational only; the persisted cursor decides where a download resumes
    #[serde(with = "crate::serde_bytes", default)]
    pub page_token: Vec<u8>,
    #[serde(default)]
    pub download_mode: DownloadMode,
}

impl DownloadBlobRequest {
    pub fn new(api_key: impl Into<String>, constraints: BlobConstraints, public_key: Vec<u8>) -> Self {
        Self {
            api_key: api_key.into(),
            metadata: Metadata {
                blob_constraints: constraints,
                crypto_keys: CryptoKeys { public_key },
            },
            page_token: Vec::new(),
            download_mode: DownloadMode::default(),
        }
    }

    #[must_use]
    pub fn with_download_mode(mut self, download_mode: DownloadMode) -> Self {
        self.download_mode = download_mode;
        self
    }

    #[must_use]
    pub fn client(&self) -> Client {
        self.metadata.blob_constraints.client
    }
}

/// Outcome reported by the service for a download
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadStatus {
    #[default]
    Unspecified,
    BlobAvailable,
    NoNewBlob,
    ClientUnsupported,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtectionComponentType {
    #[default]
    Unspecified,
    Signature,
    TransparencyProof,
    Metadata,
}

/// Auxiliary material delivered alongside a blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionComponent {
    #[serde(rename = "type", default)]
    pub component_type: ProtectionComponentType,
    #[serde(default)]
    pub is_partial_update: bool,
    #[serde(default)]
    pub partial_update_index: i32,
    #[serde(with = "crate::serde_bytes", default)]
    pub blob: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryId {
    pub leaf_index: i64,
    pub tree_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCheckpoint {
    #[serde(with = "crate::serde_bytes", default)]
    pub checkpoint: Vec<u8>,
    #[serde(with = "crate::serde_bytes", default)]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    #[serde(with = "crate::serde_bytes::list", default)]
    pub hashes: Vec<Vec<u8>>,
}

/// Transparency log proof that a blob was published
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionProof {
    #[serde(default)]
    pub log_entry_id: LogEntryId,
    #[serde(default)]
    pub log_checkpoint: LogCheckpoint,
    #[serde(default)]
    pub inclusion_proof: InclusionProof,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBlobResponse {
    /// Empty when the service had nothing new to deliver
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

/// Request for the manifest describing the blobs available to a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetManifestConfigRequest {
    pub api_key: String,
    pub metadata: Metadata,
    #[serde(default)]
    pub compress_manifest: bool,
}

impl GetManifestConfigRequest {
    pub fn new(api_key: impl Into<String>, constraints: BlobConstraints, public_key: Vec<u8>) -> Self {
        Self {
            api_key: api_key.into(),
            metadata: Metadata {
                blob_constraints: constraints,
                crypto_keys: CryptoKeys { public_key },
            },
            compress_manifest: false,
        }
    }

    #[must_use]
    pub fn with_compression(mut self, compress_manifest: bool) -> Self {
        self.compress_manifest = compress_manifest;
        self
    }

    #[must_use]
    pub fn client(&self) -> Client {
        self.metadata.blob_constraints.client
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetManifestConfigResponse {
    /// Inflated manifest, re-encrypted to the caller's key when one applies
    #[serde(with = "crate::serde_bytes", default)]
    pub manifest_config: Vec<u8>,
}
