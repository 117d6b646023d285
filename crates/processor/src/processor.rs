//! The download pipeline
//!
//! Both entry points run the same stages: feature gate, validation,
//! authorization, cursor load, integrity check, network call, translation
//! and finalize. Everything after authorization reports exactly one success
//! or failure to the network-usage log.

use std::future::Future;
use std::sync::Arc;

use pd_attestation::Attestor;
use pd_config::resources_semaphore::acquire_semaphore_permit;
use pd_config::ReencryptionPolicy;
use pd_errors::{Error, UserFacingError};
use pd_events::{
    DownloadOutcome, EventEmitter, EventSender, FailureContext, NetworkUsageLog, OperationKind,
};
use pd_keys::{KeyManager, KeySet, ObtainedKey};
use pd_net::ProgramBlobService;
use pd_state::StateStore;
use pd_translate::{
    integrity_response, to_internal_manifest_response, to_internal_response, RequestTranslator,
};
use pd_types::{
    wire, BlobConstraints, ClientPersistentState, DownloadBlobRequest, DownloadBlobResponse,
    GetManifestConfigRequest, GetManifestConfigResponse, Metadata, VM_CLIENT_ID,
};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::validation::validate_request;

/// Orchestrates protected downloads for every registered client
///
/// Construct with [`crate::ProtectedDownloadProcessorBuilder`]. The processor
/// keeps no per-client state between calls; concurrent calls for the same
/// client race on the persisted cursor and the last write wins.
pub struct ProtectedDownloadProcessor {
    pub(crate) enabled: bool,
    pub(crate) reencryption: ReencryptionPolicy,
    pub(crate) translator: RequestTranslator,
    pub(crate) keys: KeyManager,
    pub(crate) attestor: Attestor,
    pub(crate) service: Arc<dyn ProgramBlobService>,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) network_usage: Arc<dyn NetworkUsageLog>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) permits: Arc<Semaphore>,
    pub(crate) events: Option<EventSender>,
}

/// Key material and attestation evidence for one request
struct Integrity {
    key: ObtainedKey,
    response: wire::IntegrityResponse,
}

/// Error raised after authorization, with the bytes received before it
struct Failure {
    error: Error,
    size: u64,
}

impl Failure {
    fn after_receiving(size: u64) -> impl FnOnce(Error) -> Self {
        move |error| Self { error, size }
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self { error, size: 0 }
    }
}

struct Completed<R> {
    response: R,
    size: u64,
}

impl EventEmitter for ProtectedDownloadProcessor {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl ProtectedDownloadProcessor {
    /// Download the next blob for the request's client.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that failed. Attestation failures
    /// are never returned; they travel to the service as a status.
    pub async fn download(&self, request: DownloadBlobRequest) -> Result<DownloadBlobResponse, Error> {
        self.download_inner(&request, None).await
    }

    /// [`Self::download`], abandoned with `Error::Cancelled` once `cancel` fires.
    ///
    /// A cancelled download never writes the cursor.
    ///
    /// # Errors
    ///
    /// As [`Self::download`], plus `Error::Cancelled`.
    pub async fn download_with_cancellation(
        &self,
        request: DownloadBlobRequest,
        cancel: CancellationToken,
    ) -> Result<DownloadBlobResponse, Error> {
        self.download_inner(&request, Some(&cancel)).await
    }

    /// Fetch the manifest describing the blobs available to the client.
    ///
    /// Manifests do not move the download cursor.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that failed.
    pub async fn get_manifest_config(
        &self,
        request: GetManifestConfigRequest,
    ) -> Result<GetManifestConfigResponse, Error> {
        self.manifest_inner(&request, None).await
    }

    /// [`Self::get_manifest_config`] with cancellation.
    ///
    /// # Errors
    ///
    /// As [`Self::get_manifest_config`], plus `Error::Cancelled`.
    pub async fn get_manifest_config_with_cancellation(
        &self,
        request: GetManifestConfigRequest,
        cancel: CancellationToken,
    ) -> Result<GetManifestConfigResponse, Error> {
        self.manifest_inner(&request, Some(&cancel)).await
    }

    /// Store the attested environment's public key under the sentinel id.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is disabled, the key is not a valid
    /// public key, or the store write fails.
    pub async fn provision_attested_environment(&self, public_key: &[u8]) -> Result<(), Error> {
        if !self.enabled {
            return Err(Error::FeatureDisabled);
        }
        let key_set = KeySet::from_public_key(public_key)?;
        let record = ClientPersistentState::default().with_external_key_set(public_key.to_vec());
        self.store.write_state(VM_CLIENT_ID, &record).await?;
        tracing::info!(
            key_hash = %key_set.public_key_hash_for_logging(),
            "provisioned attested environment public key"
        );
        self.emit_state_committed(VM_CLIENT_ID, false);
        Ok(())
    }

    #[must_use]
    pub fn translator(&self) -> &RequestTranslator {
        &self.translator
    }

    async fn download_inner(
        &self,
        request: &DownloadBlobRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<DownloadBlobResponse, Error> {
        let client_id = self.admit(&request.api_key, &request.metadata)?;
        let result = self.run_download(&client_id, request, cancel).await;
        self.record(&client_id, OperationKind::Download, result)
    }

    async fn manifest_inner(
        &self,
        request: &GetManifestConfigRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<GetManifestConfigResponse, Error> {
        let client_id = self.admit(&request.api_key, &request.metadata)?;
        let result = self.run_manifest(&client_id, request, cancel).await;
        self.record(&client_id, OperationKind::Manifest, result)
    }

    /// Feature gate, validation and authorization. Nothing is logged to the
    /// network-usage log unless all three pass.
    fn admit(&self, api_key: &str, metadata: &Metadata) -> Result<String, Error> {
        if !self.enabled {
            return Err(Error::FeatureDisabled);
        }
        validate_request(api_key, &metadata.crypto_keys.public_key)?;
        let client_id = self
            .translator
            .client_id(metadata.blob_constraints.client)?
            .to_string();
        self.network_usage.check_allowed_request(&client_id)?;
        Ok(client_id)
    }

    async fn run_download(
        &self,
        client_id: &str,
        request: &DownloadBlobRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Completed<DownloadBlobResponse>, Failure> {
        let _permit = acquire_semaphore_permit(self.permits.clone(), "download").await?;
        self.emit_download_started(client_id, OperationKind::Download);

        let constraints = &request.metadata.blob_constraints;
        let state = self.read_or_create_state(client_id).await?;
        let integrity = self.integrity_check(client_id, constraints, state).await?;
        let internal_key = self.internal_key(&request.metadata.crypto_keys.public_key)?;
        let external_key = integrity.key.key_set;

        let external_request = self.translator.to_external_download_request(
            request,
            external_key.public_key(),
            &integrity.key.state.page_token,
            integrity.response,
        )?;
        let external_response = with_cancellation(
            cancel,
            self.service.download_blob(&request.api_key, &external_request),
        )
        .await?;

        let size = to_size(external_response.approximate_size());
        let next_page_token = external_response.next_page_token.clone();
        let response = to_internal_response(
            external_response,
            &external_key,
            internal_key.as_ref(),
            client_id.as_bytes(),
        )
        .map_err(|e| Failure::after_receiving(size)(e.into()))?;

        let state = integrity
            .key
            .state
            .completed(Some(next_page_token), self.clock.now_millis());
        self.commit(client_id, &state, true, cancel)
            .await
            .map_err(Failure::after_receiving(size))?;

        Ok(Completed { response, size })
    }

    async fn run_manifest(
        &self,
        client_id: &str,
        request: &GetManifestConfigRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<Completed<GetManifestConfigResponse>, Failure> {
        let _permit = acquire_semaphore_permit(self.permits.clone(), "manifest").await?;
        self.emit_download_started(client_id, OperationKind::Manifest);

        let constraints = &request.metadata.blob_constraints;
        let state = self.read_or_create_state(client_id).await?;
        let integrity = self.integrity_check(client_id, constraints, state).await?;
        let internal_key = self.internal_key(&request.metadata.crypto_keys.public_key)?;
        let external_key = integrity.key.key_set;

        let external_request = self.translator.to_external_manifest_request(
            request,
            external_key.public_key(),
            integrity.response,
        )?;
        let external_response = with_cancellation(
            cancel,
            self.service
                .get_manifest_config(&request.api_key, &external_request),
        )
        .await?;

        let size = to_size(external_response.approximate_size());
        let response = to_internal_manifest_response(
            external_response,
            &external_key,
            internal_key.as_ref(),
            client_id.as_bytes(),
        )
        .map_err(|e| Failure::after_receiving(size)(e.into()))?;

        let state = integrity
            .key
            .state
            .completed(None, self.clock.now_millis());
        self.commit(client_id, &state, false, cancel)
            .await
            .map_err(Failure::after_receiving(size))?;

        Ok(Completed { response, size })
    }

    async fn read_or_create_state(&self, client_id: &str) -> Result<ClientPersistentState, Error> {
        if let Some(state) = self.store.read_state(client_id).await? {
            tracing::info!(client_id, "found persistent state");
            self.emit_state_loaded(client_id);
            Ok(state)
        } else {
            tracing::info!(client_id, "creating new persistent state");
            self.emit_state_created(client_id);
            Ok(ClientPersistentState::default())
        }
    }

    async fn integrity_check(
        &self,
        client_id: &str,
        constraints: &BlobConstraints,
        state: ClientPersistentState,
    ) -> Result<Integrity, Error> {
        let key = self
            .keys
            .obtain_key(client_id, constraints.client_version.kind, state)
            .await?;
        let content_binding = self
            .translator
            .content_binding(key.key_set.public_key(), constraints)?;
        let outcome = self.attestor.attest(&content_binding).await;
        tracing::debug!(client_id, status = %outcome.status, "integrity check done");
        self.emit_attestation_completed(client_id, outcome.status);

        Ok(Integrity {
            response: integrity_response(&outcome, content_binding),
            key,
        })
    }

    /// Key the payloads are sealed to before they reach the caller
    fn internal_key(&self, request_public_key: &[u8]) -> Result<Option<KeySet>, Error> {
        match self.reencryption {
            ReencryptionPolicy::RequestKey => Ok(Some(KeySet::from_public_key(request_public_key)?)),
            ReencryptionPolicy::Disabled => Ok(None),
        }
    }

    async fn commit(
        &self,
        client_id: &str,
        state: &ClientPersistentState,
        advances_cursor: bool,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), Error> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }
        self.store.write_state(client_id, state).await?;
        self.emit_state_committed(client_id, advances_cursor && !state.page_token.is_empty());
        Ok(())
    }

    fn record<R>(
        &self,
        client_id: &str,
        operation: OperationKind,
        result: Result<Completed<R>, Failure>,
    ) -> Result<R, Error> {
        match result {
            Ok(Completed { response, size }) => {
                tracing::info!(client_id, operation = operation.as_str(), size, "operation succeeded");
                self.network_usage
                    .log_download(client_id, operation, DownloadOutcome::Succeeded, size);
                Ok(response)
            }
            Err(Failure { error, size }) => {
                tracing::warn!(
                    client_id,
                    operation = operation.as_str(),
                    size,
                    code = error.user_code().unwrap_or("unknown"),
                    error = %error,
                    "operation failed"
                );
                self.network_usage.log_download(
                    client_id,
                    operation,
                    DownloadOutcome::Failed(FailureContext::from_error(&error)),
                    size,
                );
                Err(error)
            }
        }
    }
}

async fn with_cancellation<T>(
    cancel: Option<&CancellationToken>,
    operation: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            result = operation => result,
        },
        None => operation.await,
    }
}

fn to_size(bytes: usize) -> u64 {
    u64::try_from(bytes).unwrap_or(u64::MAX)
}
