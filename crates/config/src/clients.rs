//! Per-client overrides and the flag-backed build id reader

use pd_types::{BuildIdFlag, BuildIdReader, ClientConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A `[clients.<name>]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Replaces the compiled-in client id
    pub id: Option<String>,
    pub build_id_flag: Option<BuildIdFlag>,
}

impl ClientSettings {
    pub(crate) fn apply(&self, config: &mut ClientConfig) {
        if let Some(id) = &self.id {
            config.client_id.clone_from(id);
        }
        if let Some(flag) = &self.build_id_flag {
            config.build_id_flag = Some(flag.clone());
        }
    }
}

/// Reads build ids from the `[flags]` tables of the configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigBuildIdReader {
    flags: BTreeMap<String, BTreeMap<String, i64>>,
}

impl ConfigBuildIdReader {
    #[must_use]
    pub fn new(flags: BTreeMap<String, BTreeMap<String, i64>>) -> Self {
        Self { flags }
    }
}

impl BuildIdReader for ConfigBuildIdReader {
    fn read_build_id(&self, flag: &BuildIdFlag) -> Option<i64> {
        self.flags.get(&flag.namespace)?.get(&flag.name).copied()
    }
}
