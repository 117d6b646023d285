//! Hybrid encryption key sets
//!
//! Payloads are sealed with HPKE (X25519 + HKDF-SHA256 + AES-128-GCM) in base
//! mode. A ciphertext is the 32-byte encapsulated key followed by the AEAD
//! output, and callers bind it to context through the associated data.

use crate::master::MasterKey;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hpke::aead::AesGcm128;
use hpke::kdf::HkdfSha256;
use hpke::kem::X25519HkdfSha256;
use hpke::{Deserializable, Kem as KemTrait, OpModeR, OpModeS, Serializable};
use pd_errors::CryptoError;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

type Kem = X25519HkdfSha256;
type Kdf = HkdfSha256;
type Aead128 = AesGcm128;

const HPKE_INFO: &[u8] = b"pd-hybrid-encryption-v1";
const ENCAPPED_KEY_LEN: usize = 32;
const WRAP_NONCE_LEN: usize = 12;
const WRAP_AAD: &[u8] = b"pd-keyset-v1";
const KEYSET_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerializedKeySet {
    version: u8,
    #[serde(with = "pd_types::serde_bytes")]
    public_key: Vec<u8>,
    #[serde(with = "pd_types::serde_bytes::option", default)]
    private_key: Option<Vec<u8>>,
}

/// A hybrid encryption keypair, or only its public half
#[derive(Clone)]
pub struct KeySet {
    public_key: Vec<u8>,
    private_key: Option<Zeroizing<Vec<u8>>>,
}

impl KeySet {
    /// Generate a fresh keypair
    #[must_use]
    pub fn generate() -> Self {
        let (private_key, public_key) = Kem::gen_keypair(&mut rand::thread_rng());
        Self {
            public_key: public_key.to_bytes().to_vec(),
            private_key: Some(Zeroizing::new(private_key.to_bytes().to_vec())),
        }
    }

    /// Wrap a bare public key. The result can encrypt but never decrypt.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidPublicKey` if the bytes are not a valid key.
    pub fn from_public_key(public_key: &[u8]) -> Result<Self, CryptoError> {
        <Kem as KemTrait>::PublicKey::from_bytes(public_key)
            .map_err(|e| CryptoError::InvalidPublicKey(format!("{e:?}")))?;
        Ok(Self {
            public_key: public_key.to_vec(),
            private_key: None,
        })
    }

    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Short stable digest of the public key, safe to log
    #[must_use]
    pub fn public_key_hash_for_logging(&self) -> String {
        let digest = Sha256::digest(&self.public_key);
        hex::encode(&digest[..8])
    }

    /// Seal `plaintext` to this key set's public key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptFailed` if sealing fails.
    pub fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let recipient = <Kem as KemTrait>::PublicKey::from_bytes(&self.public_key)
            .map_err(|e| CryptoError::InvalidPublicKey(format!("{e:?}")))?;

        let (encapped_key, ciphertext) = hpke::single_shot_seal::<Aead128, Kdf, Kem, _>(
            &OpModeS::Base,
            &recipient,
            HPKE_INFO,
            plaintext,
            associated_data,
            &mut rand::thread_rng(),
        )
        .map_err(|e| CryptoError::EncryptFailed {
            reason: format!("{e:?}"),
        })?;

        let mut sealed = Vec::with_capacity(ENCAPPED_KEY_LEN + ciphertext.len());
        sealed.extend_from_slice(&encapped_key.to_bytes());
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a payload sealed to this key set.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MissingPrivateKey` for public-only key sets, and
    /// `CryptoError::DecryptFailed` if the payload or associated data do not match.
    pub fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let private_key = self
            .private_key
            .as_ref()
            .ok_or(CryptoError::MissingPrivateKey)?;
        let recipient = <Kem as KemTrait>::PrivateKey::from_bytes(private_key)
            .map_err(|e| CryptoError::InvalidKeySet(format!("{e:?}")))?;

        if ciphertext.len() < ENCAPPED_KEY_LEN {
            return Err(CryptoError::DecryptFailed {
                reason: format!("ciphertext of {} bytes is truncated", ciphertext.len()),
            });
        }
        let (encapped_bytes, body) = ciphertext.split_at(ENCAPPED_KEY_LEN);
        let encapped_key = <Kem as KemTrait>::EncappedKey::from_bytes(encapped_bytes).map_err(|e| {
            CryptoError::DecryptFailed {
                reason: format!("{e:?}"),
            }
        })?;

        hpke::single_shot_open::<Aead128, Kdf, Kem>(
            &OpModeR::Base,
            &recipient,
            &encapped_key,
            HPKE_INFO,
            body,
            associated_data,
        )
        .map_err(|e| CryptoError::DecryptFailed {
            reason: format!("{e:?}"),
        })
    }

    /// Serialize and wrap this key set under the master key.
    ///
    /// # Errors
    ///
    /// Fails if wrapping fails.
    pub fn to_encrypted_key_set(&self, master: &MasterKey) -> Result<Vec<u8>, CryptoError> {
        let serialized = Zeroizing::new(
            serde_json::to_vec(&SerializedKeySet {
                version: KEYSET_VERSION,
                public_key: self.public_key.clone(),
                private_key: self.private_key.as_ref().map(|k| k.to_vec()),
            })
            .map_err(|e| CryptoError::InvalidKeySet(e.to_string()))?,
        );

        let cipher = Aes256Gcm::new_from_slice(master.as_bytes())
            .map_err(|e| CryptoError::MasterKeyUnavailable(e.to_string()))?;
        let mut nonce = [0u8; WRAP_NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let wrapped = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &serialized,
                    aad: WRAP_AAD,
                },
            )
            .map_err(|e| CryptoError::EncryptFailed {
                reason: format!("key set wrap failed: {e}"),
            })?;

        let mut out = Vec::with_capacity(WRAP_NONCE_LEN + wrapped.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&wrapped);
        Ok(out)
    }

    /// Unwrap a key set produced by [`KeySet::to_encrypted_key_set`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeySet` if the bytes were not wrapped by
    /// this master key or do not hold a key set.
    pub fn from_encrypted_key_set(bytes: &[u8], master: &MasterKey) -> Result<Self, CryptoError> {
        if bytes.len() <= WRAP_NONCE_LEN {
            return Err(CryptoError::InvalidKeySet("wrapped key set is truncated".into()));
        }
        let cipher = Aes256Gcm::new_from_slice(master.as_bytes())
            .map_err(|e| CryptoError::MasterKeyUnavailable(e.to_string()))?;

        let (nonce, wrapped) = bytes.split_at(WRAP_NONCE_LEN);
        let serialized = Zeroizing::new(
            cipher
                .decrypt(
                    Nonce::from_slice(nonce),
                    Payload {
                        msg: wrapped,
                        aad: WRAP_AAD,
                    },
                )
                .map_err(|_| {
                    CryptoError::InvalidKeySet("key set was not wrapped by this master key".into())
                })?,
        );

        let parsed: SerializedKeySet = serde_json::from_slice(&serialized)
            .map_err(|e| CryptoError::InvalidKeySet(e.to_string()))?;
        if parsed.version != KEYSET_VERSION {
            return Err(CryptoError::InvalidKeySet(format!(
                "unsupported key set version {}",
                parsed.version
            )));
        }

        let key_set = match parsed.private_key {
            Some(private_key) => {
                <Kem as KemTrait>::PrivateKey::from_bytes(&private_key)
                    .map_err(|e| CryptoError::InvalidKeySet(format!("{e:?}")))?;
                Self {
                    public_key: parsed.public_key,
                    private_key: Some(Zeroizing::new(private_key)),
                }
            }
            None => Self::from_public_key(&parsed.public_key)?,
        };
        Ok(key_set)
    }
}

impl fmt::Debug for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySet")
            .field("public_key_hash", &self.public_key_hash_for_logging())
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_only_key_cannot_decrypt() {
        let full = KeySet::generate();
        let public_only = KeySet::from_public_key(full.public_key()).unwrap();
        let sealed = public_only.encrypt(b"payload", b"client").unwrap();

        assert_eq!(
            public_only.decrypt(&sealed, b"client").unwrap_err(),
            CryptoError::MissingPrivateKey
        );
        assert_eq!(full.decrypt(&sealed, b"client").unwrap(), b"payload");
    }

    #[test]
    fn associated_data_is_bound() {
        let key_set = KeySet::generate();
        let sealed = key_set.encrypt(b"payload", b"client-a").unwrap();
        assert!(matches!(
            key_set.decrypt(&sealed, b"client-b"),
            Err(CryptoError::DecryptFailed { .. })
        ));
    }

    #[test]
    fn wrong_master_key_is_rejected() {
        let key_set = KeySet::generate();
        let wrapped = key_set.to_encrypted_key_set(&MasterKey::new([1; 32])).unwrap();
        let err = KeySet::from_encrypted_key_set(&wrapped, &MasterKey::new([2; 32])).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeySet(_)));
    }

    #[test]
    fn logging_hash_is_stable() {
        let key_set = KeySet::generate();
        let reparsed = KeySet::from_public_key(key_set.public_key()).unwrap();
        assert_eq!(
            key_set.public_key_hash_for_logging(),
            reparsed.public_key_hash_for_logging()
        );
        assert_eq!(key_set.public_key_hash_for_logging().len(), 16);
    }

    #[test]
    fn invalid_public_key_is_rejected() {
        assert!(matches!(
            KeySet::from_public_key(&[1, 2, 3]),
            Err(CryptoError::InvalidPublicKey(_))
        ));
    }
}
