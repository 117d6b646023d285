//! Internal requests to the service's wire schema

use crate::binding::content_binding_hash;
use pd_errors::{AuthorizationError, Error};
use pd_types::{
    wire, AttestationOutcome, BlobConstraints, BuildIdReader, Client, ClientRegistry,
    DownloadBlobRequest, GetManifestConfigRequest, Label,
};
use std::sync::Arc;

pub const LANGUAGE_CODE_LABEL: &str = "language_code";
pub const DEFAULT_LANGUAGE_CODE: &str = "en";
pub const CLIENT_GROUP_LABEL: &str = "client_group";
pub const VARIANT_LABEL: &str = "variant";
pub const BUILD_ID_LABEL: &str = "build_id";

/// Client version number reported to the service
pub const CLIENT_VERSION: i64 = 1;

/// Builds external requests for the clients in a registry
#[derive(Clone)]
pub struct RequestTranslator {
    registry: Arc<ClientRegistry>,
    build_ids: Option<Arc<dyn BuildIdReader>>,
}

impl RequestTranslator {
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>, build_ids: Option<Arc<dyn BuildIdReader>>) -> Self {
        Self {
            registry,
            build_ids,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Opaque id of `client`.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::UnknownClient` if the client is not registered.
    pub fn client_id(&self, client: Client) -> Result<&str, Error> {
        self.registry.client_id(client).ok_or_else(|| {
            AuthorizationError::UnknownClient {
                client: client.to_string(),
            }
            .into()
        })
    }

    fn build_id(&self, client: Client) -> Option<i64> {
        let flag = self.registry.config(client)?.build_id_flag()?;
        let reader = self.build_ids.as_ref()?;
        let build_id = reader.read_build_id(flag);
        if build_id.is_none() {
            tracing::debug!(%client, namespace = %flag.namespace, flag = %flag.name, "build id flag unset");
        }
        build_id
    }

    /// Labels attached to the external constraints, in hashing order
    #[must_use]
    pub fn labels(&self, constraints: &BlobConstraints) -> Vec<Label> {
        let mut labels = vec![
            Label::new(LANGUAGE_CODE_LABEL, DEFAULT_LANGUAGE_CODE),
            Label::new(CLIENT_GROUP_LABEL, constraints.client_group.as_label()),
        ];
        if constraints.variant.is_specified() {
            labels.push(Label::new(VARIANT_LABEL, constraints.variant.as_label()));
        }
        if let Some(build_id) = self.build_id(constraints.client) {
            labels.push(Label::new(BUILD_ID_LABEL, build_id.to_string()));
        }
        labels
    }

    /// External form of `constraints`.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::UnknownClient` for unregistered clients.
    pub fn external_constraints(
        &self,
        constraints: &BlobConstraints,
    ) -> Result<wire::BlobConstraints, Error> {
        Ok(wire::BlobConstraints {
            client_id: self.client_id(constraints.client)?.to_string(),
            device_tier: constraints.device_tier.as_label().to_string(),
            client_version: wire::ClientVersion {
                kind: constraints.client_version.kind,
                version: CLIENT_VERSION,
            },
            labels: self.labels(constraints),
        })
    }

    /// Content-binding hash for a request made with `public_key`.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::UnknownClient` for unregistered clients.
    pub fn content_binding(
        &self,
        public_key: &[u8],
        constraints: &BlobConstraints,
    ) -> Result<String, Error> {
        Ok(content_binding_hash(
            public_key,
            &self.external_constraints(constraints)?,
        ))
    }

    fn external_metadata(
        &self,
        public_key: &[u8],
        constraints: &BlobConstraints,
    ) -> Result<wire::Metadata, Error> {
        Ok(wire::Metadata {
            crypto_keys: wire::CryptoKeys {
                public_key: public_key.to_vec(),
                use_client_id_seed: true,
            },
            blob_constraints: self.external_constraints(constraints)?,
            counters: wire::Counters::default(),
        })
    }

    /// External download request.
    ///
    /// `public_key` is the key the service encrypts to, `page_token` the
    /// persisted cursor.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::UnknownClient` for unregistered clients.
    pub fn to_external_download_request(
        &self,
        request: &DownloadBlobRequest,
        public_key: &[u8],
        page_token: &[u8],
        integrity: wire::IntegrityResponse,
    ) -> Result<wire::DownloadBlobRequest, Error> {
        Ok(wire::DownloadBlobRequest {
            integrity_response: integrity,
            metadata: self.external_metadata(public_key, &request.metadata.blob_constraints)?,
            page_token: page_token.to_vec(),
            download_mode: request.download_mode,
            protection_proof_config: wire::ProtectionProofConfig::default(),
        })
    }

    /// External manifest request.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationError::UnknownClient` for unregistered clients.
    pub fn to_external_manifest_request(
        &self,
        request: &GetManifestConfigRequest,
        public_key: &[u8],
        integrity: wire::IntegrityResponse,
    ) -> Result<wire::GetManifestConfigRequest, Error> {
        Ok(wire::GetManifestConfigRequest {
            integrity_response: integrity,
            metadata: self.external_metadata(public_key, &request.metadata.blob_constraints)?,
            compress_manifest: request.compress_manifest,
        })
    }
}

/// Integrity section of an external request
#[must_use]
pub fn integrity_response(
    outcome: &AttestationOutcome,
    content_binding: String,
) -> wire::IntegrityResponse {
    wire::IntegrityResponse {
        status: outcome.status,
        attestation_token: outcome.token.clone().unwrap_or_default(),
        content_binding,
    }
}
