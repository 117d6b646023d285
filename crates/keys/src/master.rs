//! Master keys that wrap persisted key sets

use async_trait::async_trait;
use pd_errors::CryptoError;
use rand::RngCore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

pub const MASTER_KEY_LEN: usize = 32;

/// A 256-bit AES key, wiped on drop
#[derive(Clone)]
pub struct MasterKey(Zeroizing<[u8; MASTER_KEY_LEN]>);

impl MasterKey {
    #[must_use]
    pub fn new(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; MASTER_KEY_LEN]);
        rand::thread_rng().fill_bytes(&mut *bytes);
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

/// Source of the master key
#[async_trait]
pub trait MasterKeyProvider: Send + Sync {
    /// Return the master key, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MasterKeyUnavailable` if the key cannot be read or created.
    async fn read_or_generate(&self) -> Result<MasterKey, CryptoError>;
}

/// Fixed master key, for tests and hosts that manage the key themselves
pub struct StaticMasterKeyProvider {
    key: MasterKey,
}

impl StaticMasterKeyProvider {
    #[must_use]
    pub fn new(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self {
            key: MasterKey::new(bytes),
        }
    }
}

#[async_trait]
impl MasterKeyProvider for StaticMasterKeyProvider {
    async fn read_or_generate(&self) -> Result<MasterKey, CryptoError> {
        Ok(self.key.clone())
    }
}

/// Master key kept in a file readable only by the owner
///
/// The file is created with a random key the first time it is needed and the
/// key is cached for the lifetime of the provider. Concurrent first callers
/// wait on one load instead of racing to create the file.
pub struct FileMasterKeyProvider {
    path: PathBuf,
    cached: OnceCell<MasterKey>,
}

impl FileMasterKeyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, what: &str, err: impl std::fmt::Display) -> CryptoError {
        CryptoError::MasterKeyUnavailable(format!("{what} {}: {err}", self.path.display()))
    }

    async fn load(&self) -> Result<Option<MasterKey>, CryptoError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.unavailable("failed to read", e)),
        };
        let key: [u8; MASTER_KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            self.unavailable(
                "unexpected length in",
                format!("{} bytes, expected {MASTER_KEY_LEN}", bytes.len()),
            )
        })?;
        Ok(Some(MasterKey::new(key)))
    }

    async fn create(&self) -> Result<MasterKey, CryptoError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.unavailable("failed to create", e))?;
        }
        let key = MasterKey::generate();

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| self.unavailable("failed to create", e))?;
        file.write_all(key.as_bytes())
            .await
            .map_err(|e| self.unavailable("failed to write", e))?;
        file.sync_all()
            .await
            .map_err(|e| self.unavailable("failed to write", e))?;

        tracing::info!(path = %self.path.display(), "generated new master key");
        Ok(key)
    }
}

#[async_trait]
impl MasterKeyProvider for FileMasterKeyProvider {
    async fn read_or_generate(&self) -> Result<MasterKey, CryptoError> {
        let key = self
            .cached
            .get_or_try_init(|| async {
                match self.load().await? {
                    Some(key) => Ok(key),
                    None => self.create().await,
                }
            })
            .await?;
        Ok(key.clone())
    }
}
