//! Logical clients and the registry that maps them to opaque client ids

use pd_errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A logical client of the download engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Client {
    ThreatScanner,
    ThreatScannerCore,
    ThreatScannerVm,
    TextInput,
    TextOutput,
    ImageInput,
    ImageOutput,
    MessagesText,
    Summarization,
    ModelDownload,
}

impl Client {
    /// Every known client, in declaration order
    pub const ALL: [Client; 10] = [
        Self::ThreatScanner,
        Self::ThreatScannerCore,
        Self::ThreatScannerVm,
        Self::TextInput,
        Self::TextOutput,
        Self::ImageInput,
        Self::ImageOutput,
        Self::MessagesText,
        Self::Summarization,
        Self::ModelDownload,
    ];

    /// Name used in configuration tables and on the command line
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ThreatScanner => "threat-scanner",
            Self::ThreatScannerCore => "threat-scanner-core",
            Self::ThreatScannerVm => "threat-scanner-vm",
            Self::TextInput => "text-input",
            Self::TextOutput => "text-output",
            Self::ImageInput => "image-input",
            Self::ImageOutput => "image-output",
            Self::MessagesText => "messages-text",
            Self::Summarization => "summarization",
            Self::ModelDownload => "model-download",
        }
    }

    /// Compiled-in opaque id, used unless configuration overrides it
    #[must_use]
    pub const fn default_client_id(self) -> &'static str {
        match self {
            Self::ThreatScanner => "org.pd.scanner",
            Self::ThreatScannerCore => "org.pd.scanner:2793571637033546290",
            Self::ThreatScannerVm => "org.pd.scanner:2525461103339185322",
            Self::TextInput => "org.pd.inference:3649180271731021675",
            Self::TextOutput => "org.pd.inference:7923848966216590666",
            Self::ImageInput => "org.pd.inference:6120135725815620389",
            Self::ImageOutput => "org.pd.inference:16223496253676012401",
            Self::MessagesText => "org.pd.inference:4970947506931743799",
            Self::Summarization => "org.pd.inference:8519285862245230442",
            Self::ModelDownload => "org.pd.inference:11791126134479005147",
        }
    }

    /// Look a client up by its configuration name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|client| client.name() == name)
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Client {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ConfigError::InvalidValue {
            field: "client".to_string(),
            value: s.to_string(),
        })
    }
}

impl clap::ValueEnum for Client {
    fn value_variants<'a>() -> &'a [Self] {
        &Self::ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.name()))
    }
}

/// How the caller's runtime environment is classified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientVersionType {
    #[default]
    #[serde(rename = "standard")]
    Standard,
    /// Attested protected virtual machine; keys come from a provisioned public key
    #[serde(rename = "attested-pkVM")]
    AttestedPkvm,
}

impl ClientVersionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::AttestedPkvm => "attested-pkVM",
        }
    }

    #[must_use]
    pub const fn is_attested(self) -> bool {
        matches!(self, Self::AttestedPkvm)
    }
}

impl fmt::Display for ClientVersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client version carried in the request constraints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientVersion {
    #[serde(rename = "type", default)]
    pub kind: ClientVersionType,
    #[serde(default)]
    pub version: i64,
}

/// Reference to a flag that holds a client's build id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildIdFlag {
    pub namespace: String,
    pub name: String,
}

/// Resolves build id flags to values
pub trait BuildIdReader: Send + Sync {
    /// Current value of `flag`, or `None` if it is unset
    fn read_build_id(&self, flag: &BuildIdFlag) -> Option<i64>;
}

/// Per-client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id_flag: Option<BuildIdFlag>,
}

impl ClientConfig {
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            build_id_flag: None,
        }
    }

    #[must_use]
    pub fn with_build_id_flag(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.build_id_flag = Some(BuildIdFlag {
            namespace: namespace.into(),
            name: name.into(),
        });
        self
    }

    /// The build id flag, ignoring flags with an empty name
    #[must_use]
    pub fn build_id_flag(&self) -> Option<&BuildIdFlag> {
        self.build_id_flag
            .as_ref()
            .filter(|flag| !flag.name.is_empty())
    }
}

/// Bidirectional lookup between logical clients and their opaque ids
///
/// Construction fails if two clients share an id, so lookups in either
/// direction are unambiguous for the lifetime of the registry.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    configs: HashMap<Client, ClientConfig>,
    by_id: HashMap<String, Client>,
}

impl ClientRegistry {
    /// Build a registry from explicit client settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if two clients map to the same id.
    pub fn new(configs: HashMap<Client, ClientConfig>) -> Result<Self, ConfigError> {
        let mut by_id = HashMap::with_capacity(configs.len());
        for (client, config) in &configs {
            if let Some(previous) = by_id.insert(config.client_id.clone(), *client) {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "client id '{}' is shared by {previous} and {client}; all client ids must be unique",
                        config.client_id
                    ),
                });
            }
        }
        Ok(Self { configs, by_id })
    }

    /// Registry with the compiled-in ids for every client
    #[must_use]
    pub fn with_defaults() -> Self {
        let configs: HashMap<_, _> = Client::ALL
            .into_iter()
            .map(|client| (client, ClientConfig::new(client.default_client_id())))
            .collect();
        let by_id = configs
            .iter()
            .map(|(client, config)| (config.client_id.clone(), *client))
            .collect();
        Self { configs, by_id }
    }

    #[must_use]
    pub fn client_id(&self, client: Client) -> Option<&str> {
        self.configs.get(&client).map(|c| c.client_id.as_str())
    }

    #[must_use]
    pub fn client_for_id(&self, client_id: &str) -> Option<Client> {
        self.by_id.get(client_id).copied()
    }

    #[must_use]
    pub fn config(&self, client: Client) -> Option<&ClientConfig> {
        self.configs.get(&client)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Client, &ClientConfig)> {
        self.configs.iter().map(|(client, config)| (*client, config))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
