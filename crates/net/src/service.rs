//! The remote blob distribution service

use crate::client::NetClient;
use async_trait::async_trait;
use pd_errors::Error;
use pd_types::wire;
use std::collections::HashMap;

pub const DOWNLOAD_BLOB_PATH: &str = "/v1/blobs:download";
pub const GET_MANIFEST_CONFIG_PATH: &str = "/v1/manifest:get";

/// RPC surface of the distribution service
#[async_trait]
pub trait ProgramBlobService: Send + Sync {
    async fn download_blob(
        &self,
        api_key: &str,
        request: &wire::DownloadBlobRequest,
    ) -> Result<wire::DownloadBlobResponse, Error>;

    async fn get_manifest_config(
        &self,
        api_key: &str,
        request: &wire::GetManifestConfigRequest,
    ) -> Result<wire::GetManifestConfigResponse, Error>;
}

/// Chooses the service endpoint for a client id
#[derive(Debug, Clone)]
pub struct Endpoints {
    default: String,
    overrides: HashMap<String, String>,
}

impl Endpoints {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            overrides: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_override(mut self, client_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        self.overrides.insert(client_id.into(), endpoint.into());
        self
    }

    #[must_use]
    pub fn for_client(&self, client_id: &str) -> &str {
        self.overrides
            .get(client_id)
            .map_or(self.default.as_str(), String::as_str)
    }

    fn url(&self, client_id: &str, path: &str) -> String {
        format!("{}{path}", self.for_client(client_id).trim_end_matches('/'))
    }
}

/// JSON-over-HTTPS implementation of [`ProgramBlobService`]
#[derive(Clone)]
pub struct HttpBlobService {
    client: NetClient,
    endpoints: Endpoints,
    api_key_override: Option<String>,
}

impl HttpBlobService {
    #[must_use]
    pub fn new(client: NetClient, endpoints: Endpoints) -> Self {
        Self {
            client,
            endpoints,
            api_key_override: None,
        }
    }

    /// Send `api_key` instead of the caller's key on every request
    #[must_use]
    pub fn with_api_key_override(mut self, api_key: Option<String>) -> Self {
        self.api_key_override = api_key.filter(|key| !key.is_empty());
        self
    }

    fn api_key<'a>(&'a self, requested: &'a str) -> &'a str {
        self.api_key_override.as_deref().unwrap_or(requested)
    }
}

#[async_trait]
impl ProgramBlobService for HttpBlobService {
    async fn download_blob(
        &self,
        api_key: &str,
        request: &wire::DownloadBlobRequest,
    ) -> Result<wire::DownloadBlobResponse, Error> {
        let client_id = &request.metadata.blob_constraints.client_id;
        let url = self.endpoints.url(client_id, DOWNLOAD_BLOB_PATH);
        tracing::debug!(client_id = %client_id, %url, "requesting blob");
        self.client.post_json(&url, self.api_key(api_key), request).await
    }

    async fn get_manifest_config(
        &self,
        api_key: &str,
        request: &wire::GetManifestConfigRequest,
    ) -> Result<wire::GetManifestConfigResponse, Error> {
        let client_id = &request.metadata.blob_constraints.client_id;
        let url = self.endpoints.url(client_id, GET_MANIFEST_CONFIG_PATH);
        tracing::debug!(client_id = %client_id, %url, "requesting manifest config");
        self.client.post_json(&url, self.api_key(api_key), request).await
    }
}
