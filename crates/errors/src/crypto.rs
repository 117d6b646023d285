//! Cryptographic and payload-processing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum CryptoError {
    #[error("decryption failed: {reason}")]
    DecryptFailed { reason: String },

    #[error("encryption failed: {reason}")]
    EncryptFailed { reason: String },

    #[error("cannot decrypt without a private key")]
    MissingPrivateKey,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid key set: {0}")]
    InvalidKeySet(String),

    #[error("no key available for client {client_id}")]
    NoKeyAvailable { client_id: String },

    #[error("master key unavailable: {0}")]
    MasterKeyUnavailable(String),

    #[error("decompression failed: {0}")]
    DecompressFailed(String),
}

impl UserFacingError for CryptoError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoKeyAvailable { .. } => {
                Some("Provision the attested environment key before downloading.")
            }
            Self::MasterKeyUnavailable(_) => Some("Check `security.master_key_path`."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DecryptFailed { .. } => "crypto.decrypt_failed",
            Self::EncryptFailed { .. } => "crypto.encrypt_failed",
            Self::MissingPrivateKey => "crypto.missing_private_key",
            Self::InvalidPublicKey(_) => "crypto.invalid_public_key",
            Self::InvalidKeySet(_) => "crypto.invalid_key_set",
            Self::NoKeyAvailable { .. } => "crypto.no_key_available",
            Self::MasterKeyUnavailable(_) => "crypto.master_key_unavailable",
            Self::DecompressFailed(_) => "crypto.decompress_failed",
        };
        Some(code)
    }
}
