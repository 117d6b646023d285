//! Collaborator wiring for the download processor

use crate::error::CliError;
use pd_attestation::{AttestationClient, Attestor, CommandAttestationClient};
use pd_config::Config;
use pd_events::{EventNetworkUsageLog, EventSender};
use pd_keys::FileMasterKeyProvider;
use pd_net::{Endpoints, HttpBlobService, NetClient, NetConfig};
use pd_processor::{ProtectedDownloadProcessor, ProtectedDownloadProcessorBuilder};
use pd_state::FileStateStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Build a processor backed by the file store, the HTTP service and,
/// when enabled, the attestation helper named in `config`.
pub fn build_processor(
    config: &Config,
    events: EventSender,
) -> Result<ProtectedDownloadProcessor, CliError> {
    let registry = config.client_registry()?;

    let net = NetClient::new(NetConfig {
        timeout: Duration::from_secs(config.service.timeout_secs),
        connect_timeout: Duration::from_secs(config.service.connect_timeout_secs),
        max_response_bytes: config.service.max_response_bytes,
        ..NetConfig::default()
    })?;
    let endpoints = config
        .endpoint_overrides(&registry)?
        .into_iter()
        .fold(
            Endpoints::new(config.service.endpoint.clone()),
            |endpoints, (client_id, endpoint)| endpoints.with_override(client_id, endpoint),
        );
    let service = HttpBlobService::new(net, endpoints)
        .with_api_key_override(config.service.api_key_override.clone());

    let network_usage = EventNetworkUsageLog::new(config.allowed_clients(&registry))
        .with_event_sender(events.clone());

    debug!(
        state_path = %config.state_path().display(),
        master_key_path = %config.master_key_path().display(),
        "wiring collaborators"
    );

    let processor = ProtectedDownloadProcessorBuilder::new()
        .with_config(config)?
        .with_master_keys(Arc::new(master_keys(config)))
        .with_store(Arc::new(FileStateStore::new(config.state_path())))
        .with_service(Arc::new(service))
        .with_network_usage(Arc::new(network_usage))
        .with_attestor(attestor(config)?)
        .with_event_sender(events)
        .build()?;

    info!(clients = registry.len(), "download processor ready");
    Ok(processor)
}

pub fn master_keys(config: &Config) -> FileMasterKeyProvider {
    FileMasterKeyProvider::new(config.master_key_path())
}

fn attestor(config: &Config) -> Result<Attestor, CliError> {
    if !config.security.enable_attestation {
        return Ok(Attestor::disabled());
    }
    let (program, args) = config
        .security
        .attestation_command
        .split_first()
        .ok_or_else(|| {
            CliError::InvalidArguments(
                "security.attestation_command is required when attestation is enabled".into(),
            )
        })?;
    let client: Arc<dyn AttestationClient> =
        Arc::new(CommandAttestationClient::new(program, args.to_vec()));
    Ok(Attestor::new(Some(client)))
}
