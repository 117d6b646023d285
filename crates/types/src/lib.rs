#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the protected download engine
//!
//! This crate provides the data model shared by every stage of a download:
//! the internal request/response schema exposed to callers, the external wire
//! schema spoken to the distribution service, the label tables that translate
//! between them, and the per-client persisted cursor.

pub mod api;
pub mod client;
pub mod labels;
pub mod serde_bytes;
pub mod state;
pub mod wire;

// Re-export commonly used types
pub use api::{
    BlobConstraints, CryptoKeys, DownloadBlobRequest, DownloadBlobResponse, DownloadMode,
    DownloadStatus, GetManifestConfigRequest, GetManifestConfigResponse, InclusionProof,
    LogCheckpoint, LogEntryId, Metadata, ProtectionComponent, ProtectionComponentType,
    ProtectionProof,
};
pub use client::{
    BuildIdFlag, BuildIdReader, Client, ClientConfig, ClientRegistry, ClientVersion,
    ClientVersionType,
};
pub use labels::{ClientGroup, DeviceTier, Label, Variant};
pub use state::{AttestationOutcome, AttestationStatus, ClientPersistentState, VM_CLIENT_ID};
