#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Hybrid encryption keys for protected downloads
//!
//! Every client id gets its own keypair. The service encrypts payloads to the
//! client's public key; the private half is persisted wrapped under a local
//! master key.

pub mod keyset;
pub mod manager;
pub mod master;

pub use keyset::KeySet;
pub use manager::{KeyManager, ObtainedKey};
pub use master::{
    FileMasterKeyProvider, MasterKey, MasterKeyProvider, StaticMasterKeyProvider, MASTER_KEY_LEN,
};
