#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for the protected download engine
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/pd/config.toml)
//! - Environment variables
//! - CLI flags

pub mod clients;
pub mod resources_semaphore;

pub use clients::{ClientSettings, ConfigBuildIdReader};

use pd_errors::{ConfigError, Error};
use pd_types::{Client, ClientRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub paths: PathConfig,

    /// Per-client overrides keyed by client name
    #[serde(default)]
    pub clients: BTreeMap<String, ClientSettings>,

    /// Flag values by namespace, then flag name
    #[serde(default)]
    pub flags: BTreeMap<String, BTreeMap<String, i64>>,

    #[serde(default)]
    pub network_usage: NetworkUsageConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// When false every operation fails before validation
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_concurrent_operations")]
    pub max_concurrent_operations: usize,
}

/// Distribution service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Endpoint overrides keyed by client name
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    /// Replaces the caller's API key on every request
    #[serde(default)]
    pub api_key_override: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub enable_attestation: bool,
    /// Program and arguments that produce an attestation token
    #[serde(default)]
    pub attestation_command: Vec<String>,
    #[serde(default)]
    pub reencryption: ReencryptionPolicy,
    pub master_key_path: Option<PathBuf>,
}

/// Whether downloaded payloads are sealed again to the caller's key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReencryptionPolicy {
    /// Re-encrypt to the public key carried in the request
    #[default]
    RequestKey,
    /// Hand decrypted payloads back as they are
    Disabled,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub state_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkUsageConfig {
    /// Client ids allowed on the network; empty allows every registered client
    #[serde(default)]
    pub allowed_clients: Vec<String>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_concurrent_operations: default_max_concurrent_operations(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            endpoints: BTreeMap::new(),
            api_key_override: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_attestation: false,
            attestation_command: Vec::new(),
            reencryption: ReencryptionPolicy::RequestKey,
            master_key_path: None,
        }
    }
}

// Default value functions for serde
fn default_enabled() -> bool {
    true
}

fn default_max_concurrent_operations() -> usize {
    4
}

fn default_endpoint() -> String {
    "https://blobs.example.invalid".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_max_response_bytes() -> u64 {
    32 * 1024 * 1024
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("pd").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(enabled) = std::env::var("PD_ENABLED") {
            self.general.enabled = parse_bool("PD_ENABLED", enabled)?;
        }

        if let Ok(endpoint) = std::env::var("PD_ENDPOINT") {
            self.service.endpoint = endpoint;
        }

        if let Ok(api_key) = std::env::var("PD_API_KEY_OVERRIDE") {
            self.service.api_key_override = (!api_key.is_empty()).then_some(api_key);
        }

        if let Ok(attestation) = std::env::var("PD_ENABLE_ATTESTATION") {
            self.security.enable_attestation = parse_bool("PD_ENABLE_ATTESTATION", attestation)?;
        }

        if let Ok(max) = std::env::var("PD_MAX_CONCURRENT") {
            self.general.max_concurrent_operations =
                max.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "PD_MAX_CONCURRENT".to_string(),
                    value: max,
                })?;
        }

        if let Ok(path) = std::env::var("PD_STATE_PATH") {
            self.paths.state_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Check cross-field invariants
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for out-of-range values and
    /// `ConfigError::Invalid` if client ids collide or name unknown clients.
    pub fn validate(&self) -> Result<(), Error> {
        if self.general.max_concurrent_operations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.max_concurrent_operations".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "service.timeout_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.security.enable_attestation && self.security.attestation_command.is_empty() {
            return Err(ConfigError::Invalid {
                message: "security.attestation_command is required when attestation is enabled"
                    .to_string(),
            }
            .into());
        }
        for name in self.service.endpoints.keys() {
            client_by_name(name, "service.endpoints")?;
        }
        self.client_registry()?;
        Ok(())
    }

    /// Registry of client ids with configured overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if a `[clients]` table names an unknown client or two
    /// clients end up with the same id.
    pub fn client_registry(&self) -> Result<ClientRegistry, ConfigError> {
        let mut configs: std::collections::HashMap<_, _> = ClientRegistry::with_defaults()
            .iter()
            .map(|(client, config)| (client, config.clone()))
            .collect();
        for (name, settings) in &self.clients {
            let client = client_by_name(name, "clients")?;
            if let Some(config) = configs.get_mut(&client) {
                settings.apply(config);
            }
        }
        ClientRegistry::new(configs)
    }

    /// Build id reader backed by the `[flags]` tables
    #[must_use]
    pub fn build_id_reader(&self) -> ConfigBuildIdReader {
        ConfigBuildIdReader::new(self.flags.clone())
    }

    /// Endpoint overrides as (client id, endpoint) pairs
    ///
    /// # Errors
    ///
    /// Returns an error if an override names an unknown client.
    pub fn endpoint_overrides(
        &self,
        registry: &ClientRegistry,
    ) -> Result<Vec<(String, String)>, ConfigError> {
        self.service
            .endpoints
            .iter()
            .filter_map(|(name, endpoint)| match client_by_name(name, "service.endpoints") {
                Ok(client) => registry
                    .client_id(client)
                    .map(|id| Ok((id.to_string(), endpoint.clone()))),
                Err(e) => Some(Err(e)),
            })
            .collect()
    }

    /// Client ids the network-usage log admits
    #[must_use]
    pub fn allowed_clients(&self, registry: &ClientRegistry) -> Vec<String> {
        if self.network_usage.allowed_clients.is_empty() {
            registry
                .iter()
                .map(|(_, config)| config.client_id.clone())
                .collect()
        } else {
            self.network_usage.allowed_clients.clone()
        }
    }

    /// Get the cursor state file path (with default)
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.paths
            .state_path
            .clone()
            .unwrap_or_else(|| data_dir().join("state.json"))
    }

    /// Get the master key path (with default)
    #[must_use]
    pub fn master_key_path(&self) -> PathBuf {
        self.security
            .master_key_path
            .clone()
            .unwrap_or_else(|| data_dir().join("master.key"))
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pd")
}

fn client_by_name(name: &str, field: &str) -> Result<Client, ConfigError> {
    Client::from_name(name).ok_or_else(|| ConfigError::InvalidValue {
        field: field.to_string(),
        value: name.to_string(),
    })
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}
