//! Service responses back to the caller-facing schema
//!
//! Payloads arrive encrypted to the client's external key. They are opened
//! here and, when the caller supplied a key, sealed again to it. The
//! associated data on both sides is the client id.

use flate2::read::ZlibDecoder;
use pd_errors::CryptoError;
use pd_keys::KeySet;
use pd_types::{wire, DownloadBlobResponse, GetManifestConfigResponse, ProtectionComponent};
use std::io::Read;

/// Upper bound on an inflated manifest
pub const MAX_INFLATED_MANIFEST_BYTES: u64 = 64 * 1024 * 1024;

/// Decrypt `external` and re-encrypt its payloads to `internal_key`.
///
/// The outer blob is decrypted when non-empty and re-encrypted when an
/// internal key is supplied. Protection components are always decrypted, but
/// re-encrypted only if the outer blob was non-empty; otherwise they pass
/// through in plaintext. When `external_key` has no private half the payloads
/// are forwarded untouched for the holder of that key to open.
///
/// # Errors
///
/// Returns a `CryptoError` if any payload fails to decrypt or encrypt.
pub fn to_internal_response(
    external: wire::DownloadBlobResponse,
    external_key: &KeySet,
    internal_key: Option<&KeySet>,
    associated_data: &[u8],
) -> Result<DownloadBlobResponse, CryptoError> {
    let wire::DownloadBlobResponse {
        blob,
        protection_components,
        protection_proof_v2,
        next_page_token,
        download_status,
        protection_token,
    } = external;

    let (blob, protection_components) = if external_key.has_private_key() {
        let has_outer_blob = !blob.is_empty();
        let blob = if has_outer_blob {
            replace_encryption(&blob, external_key, internal_key, associated_data)?
        } else {
            blob
        };

        let nested_key = if has_outer_blob { internal_key } else { None };
        let components = protection_components
            .into_iter()
            .map(|component| {
                translate_component(component, external_key, nested_key, associated_data)
            })
            .collect::<Result<Vec<_>, _>>()?;
        (blob, components)
    } else {
        (blob, protection_components)
    };

    Ok(DownloadBlobResponse {
        blob,
        protection_components,
        protection_proof_v2,
        next_page_token,
        download_status,
        protection_token,
    })
}

/// Decrypt, inflate and re-encrypt a manifest.
///
/// # Errors
///
/// Returns a `CryptoError` if decryption, inflation or re-encryption fails.
pub fn to_internal_manifest_response(
    external: wire::GetManifestConfigResponse,
    external_key: &KeySet,
    internal_key: Option<&KeySet>,
    associated_data: &[u8],
) -> Result<GetManifestConfigResponse, CryptoError> {
    if external.encrypted_manifest_config.is_empty() || !external_key.has_private_key() {
        return Ok(GetManifestConfigResponse {
            manifest_config: external.encrypted_manifest_config,
        });
    }

    let decrypted = external_key.decrypt(&external.encrypted_manifest_config, associated_data)?;
    let manifest = if external.is_compressed {
        inflate(&decrypted, MAX_INFLATED_MANIFEST_BYTES)?
    } else {
        decrypted
    };

    let manifest_config = match internal_key {
        Some(key) => key.encrypt(&manifest, associated_data)?,
        None => manifest,
    };
    Ok(GetManifestConfigResponse { manifest_config })
}

/// Inflate a zlib stream, refusing output larger than `limit` bytes.
///
/// # Errors
///
/// Returns `CryptoError::DecompressFailed` for corrupt or oversized input.
pub fn inflate(compressed: &[u8], limit: u64) -> Result<Vec<u8>, CryptoError> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(compressed)
        .take(limit + 1)
        .read_to_end(&mut inflated)
        .map_err(|e| CryptoError::DecompressFailed(e.to_string()))?;
    if inflated.len() as u64 > limit {
        return Err(CryptoError::DecompressFailed(format!(
            "inflated manifest exceeds {limit} bytes"
        )));
    }
    Ok(inflated)
}

fn replace_encryption(
    ciphertext: &[u8],
    external_key: &KeySet,
    internal_key: Option<&KeySet>,
    associated_data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let plaintext = external_key.decrypt(ciphertext, associated_data)?;
    match internal_key {
        Some(key) => key.encrypt(&plaintext, associated_data),
        None => Ok(plaintext),
    }
}

fn translate_component(
    mut component: ProtectionComponent,
    external_key: &KeySet,
    internal_key: Option<&KeySet>,
    associated_data: &[u8],
) -> Result<ProtectionComponent, CryptoError> {
    if !component.blob.is_empty() {
        component.blob =
            replace_encryption(&component.blob, external_key, internal_key, associated_data)?;
    }
    Ok(component)
}
