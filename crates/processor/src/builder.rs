//! Assembly of a [`ProtectedDownloadProcessor`] from its collaborators

use std::sync::Arc;

use pd_attestation::Attestor;
use pd_config::resources_semaphore::create_semaphore;
use pd_config::{Config, ReencryptionPolicy};
use pd_errors::Error;
use pd_events::{EventSender, NetworkUsageLog};
use pd_keys::{KeyManager, MasterKeyProvider};
use pd_net::ProgramBlobService;
use pd_state::StateStore;
use pd_translate::RequestTranslator;
use pd_types::{BuildIdReader, ClientRegistry};

use crate::clock::{Clock, SystemClock};
use crate::processor::ProtectedDownloadProcessor;

/// Builder for the download processor
pub struct ProtectedDownloadProcessorBuilder {
    enabled: bool,
    reencryption: ReencryptionPolicy,
    max_concurrent_operations: usize,
    registry: Option<Arc<ClientRegistry>>,
    build_ids: Option<Arc<dyn BuildIdReader>>,
    master_keys: Option<Arc<dyn MasterKeyProvider>>,
    store: Option<Arc<dyn StateStore>>,
    service: Option<Arc<dyn ProgramBlobService>>,
    network_usage: Option<Arc<dyn NetworkUsageLog>>,
    attestor: Attestor,
    clock: Arc<dyn Clock>,
    tx: Option<EventSender>,
}

impl Default for ProtectedDownloadProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtectedDownloadProcessorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            reencryption: ReencryptionPolicy::default(),
            max_concurrent_operations: 4,
            registry: None,
            build_ids: None,
            master_keys: None,
            store: None,
            service: None,
            network_usage: None,
            attestor: Attestor::disabled(),
            clock: Arc::new(SystemClock),
            tx: None,
        }
    }

    /// Apply the feature gate, policies, client registry and flag reader
    /// from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured client ids are invalid.
    pub fn with_config(mut self, config: &Config) -> Result<Self, Error> {
        self.enabled = config.general.enabled;
        self.reencryption = config.security.reencryption;
        self.max_concurrent_operations = config.general.max_concurrent_operations;
        self.registry = Some(Arc::new(config.client_registry()?));
        let build_ids: Arc<dyn BuildIdReader> = Arc::new(config.build_id_reader());
        self.build_ids = Some(build_ids);
        Ok(self)
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_reencryption(mut self, reencryption: ReencryptionPolicy) -> Self {
        self.reencryption = reencryption;
        self
    }

    #[must_use]
    pub fn with_max_concurrent_operations(mut self, max: usize) -> Self {
        self.max_concurrent_operations = max;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ClientRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn with_build_id_reader(mut self, reader: Arc<dyn BuildIdReader>) -> Self {
        self.build_ids = Some(reader);
        self
    }

    #[must_use]
    pub fn with_master_keys(mut self, master_keys: Arc<dyn MasterKeyProvider>) -> Self {
        self.master_keys = Some(master_keys);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn ProgramBlobService>) -> Self {
        self.service = Some(service);
        self
    }

    #[must_use]
    pub fn with_network_usage(mut self, network_usage: Arc<dyn NetworkUsageLog>) -> Self {
        self.network_usage = Some(network_usage);
        self
    }

    #[must_use]
    pub fn with_attestor(mut self, attestor: Attestor) -> Self {
        self.attestor = attestor;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Build the processor
    ///
    /// # Errors
    ///
    /// Returns an internal error if the master key provider, state store,
    /// blob service or network-usage log is missing.
    pub fn build(self) -> Result<ProtectedDownloadProcessor, Error> {
        let master_keys = self.master_keys.ok_or_else(|| missing("master_keys"))?;
        let store = self.store.ok_or_else(|| missing("store"))?;
        let service = self.service.ok_or_else(|| missing("service"))?;
        let network_usage = self
            .network_usage
            .ok_or_else(|| missing("network_usage"))?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ClientRegistry::with_defaults()));

        Ok(ProtectedDownloadProcessor {
            enabled: self.enabled,
            reencryption: self.reencryption,
            translator: RequestTranslator::new(registry, self.build_ids),
            keys: KeyManager::new(master_keys, store.clone()),
            attestor: self.attestor,
            service,
            store,
            network_usage,
            clock: self.clock,
            permits: create_semaphore(self.max_concurrent_operations),
            events: self.tx,
        })
    }
}

fn missing(component: &str) -> Error {
    Error::internal(format!("processor is missing its {component}"))
}
