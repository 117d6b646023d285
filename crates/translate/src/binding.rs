//! Content-binding hash tying an attestation to a request

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pd_types::wire;
use sha2::{Digest, Sha256};

/// Hash binding an attestation to `public_key` and `constraints`.
///
/// The digest covers, in order and without separators: the device tier
/// label, the client id, the raw public key, then every label's attribute
/// and value in list order. The service recomputes the same digest to verify
/// the attestation, so neither the order nor the encoding may change.
#[must_use]
pub fn content_binding_hash(public_key: &[u8], constraints: &wire::BlobConstraints) -> String {
    let mut hasher = Sha256::new();
    hasher.update(constraints.device_tier.as_bytes());
    hasher.update(constraints.client_id.as_bytes());
    hasher.update(public_key);
    for label in &constraints.labels {
        hasher.update(label.attribute.as_bytes());
        hasher.update(label.value.as_bytes());
    }
    STANDARD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_types::{ClientVersionType, Label};

    fn constraints(labels: Vec<Label>) -> wire::BlobConstraints {
        wire::BlobConstraints {
            client_id: "client".into(),
            device_tier: "High".into(),
            client_version: wire::ClientVersion {
                kind: ClientVersionType::Standard,
                version: 1,
            },
            labels,
        }
    }

    #[test]
    fn digest_matches_manual_concatenation() {
        let c = constraints(vec![Label::new("language_code", "en")]);
        let expected = STANDARD.encode(Sha256::digest(b"Highclient\x01\x02language_codeen"));
        assert_eq!(content_binding_hash(&[1, 2], &c), expected);
    }

    #[test]
    fn label_order_changes_the_hash() {
        let a = constraints(vec![Label::new("a", "1"), Label::new("b", "2")]);
        let b = constraints(vec![Label::new("b", "2"), Label::new("a", "1")]);
        assert_ne!(content_binding_hash(b"k", &a), content_binding_hash(b"k", &b));
    }
}
