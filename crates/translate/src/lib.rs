#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Translation between the caller-facing schema and the service wire schema
//!
//! Outbound, requests gain the service's labels, the client's external
//! public key, the persisted page token and the attestation result.
//! Inbound, encrypted payloads are opened with the external key and sealed
//! again to the caller's key.

mod binding;
mod request;
mod response;

pub use binding::content_binding_hash;
pub use request::{
    integrity_response, RequestTranslator, BUILD_ID_LABEL, CLIENT_GROUP_LABEL, CLIENT_VERSION,
    DEFAULT_LANGUAGE_CODE, LANGUAGE_CODE_LABEL, VARIANT_LABEL,
};
pub use response::{
    inflate, to_internal_manifest_response, to_internal_response, MAX_INFLATED_MANIFEST_BYTES,
};
