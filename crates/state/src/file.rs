//! Single-file store shaped like a key/value preferences document

use crate::{decode_record, encode_record, ClientPersistentState, StateStore};
use async_trait::async_trait;
use pd_errors::{Error, StorageError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Stores every record in one JSON object mapping `hex(client_id)` to the
/// hex-encoded record.
///
/// Writes go to a sibling temp file that is then renamed over the original,
/// so readers never observe a partially written document.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_document(&self) -> Result<BTreeMap<String, String>, Error> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::from_io_with_path(&e, &self.path).into()),
        };
        if contents.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(&contents).map_err(|e| {
            StorageError::CorruptedData {
                message: format!("{}: {e}", self.path.display()),
            }
            .into()
        })
    }

    async fn save_document(&self, document: &BTreeMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let contents = serde_json::to_vec_pretty(document)?;
        fs::write(&temp_path, contents)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &temp_path))?;

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::AtomicRenameFailed {
                message: format!("{}: {e}", self.path.display()),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn read_state(&self, client_id: &str) -> Result<Option<ClientPersistentState>, Error> {
        let _guard = self.lock.lock().await;
        let document = self.load_document().await?;
        document
            .get(&hex::encode(client_id))
            .map(|value| decode_record(client_id, value))
            .transpose()
    }

    async fn write_state(
        &self,
        client_id: &str,
        state: &ClientPersistentState,
    ) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut document = self.load_document().await?;
        document.insert(hex::encode(client_id), encode_record(state)?);
        self.save_document(&document).await.map_err(|e| match e {
            Error::Storage(StorageError::AtomicRenameFailed { message }) => {
                StorageError::WriteFailed {
                    client_id: client_id.to_string(),
                    message,
                }
                .into()
            }
            other => other,
        })?;
        tracing::debug!(client_id, path = %self.path.display(), "persisted client state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        assert!(store.read_state("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn keys_are_hex_encoded_client_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStateStore::new(&path);
        store
            .write_state("ab", &ClientPersistentState::default())
            .await
            .unwrap();

        let raw: BTreeMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw.contains_key("6162"));
        assert!(!path.with_extension("tmp").exists());
    }
}
