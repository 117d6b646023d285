//! Integration tests for persisted client state

#[cfg(test)]
mod tests {
    use pd_errors::{Error, StorageError};
    use pd_state::*;
    use tempfile::TempDir;

    fn sample_state() -> ClientPersistentState {
        ClientPersistentState {
            external_key_set: Some(vec![9, 8, 7]),
            page_token: b"page-2".to_vec(),
            last_completion_time_millis: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_file_store_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("nested").join("state.json"));

        store.write_state("client-a", &sample_state()).await.unwrap();
        store
            .write_state("client-b", &ClientPersistentState::default())
            .await
            .unwrap();

        assert_eq!(store.read_state("client-a").await.unwrap(), Some(sample_state()));
        assert_eq!(
            store.read_state("client-b").await.unwrap(),
            Some(ClientPersistentState::default())
        );
        assert_eq!(store.read_state("client-c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        FileStateStore::new(&path)
            .write_state(VM_CLIENT_ID, &sample_state())
            .await
            .unwrap();

        let reopened = FileStateStore::new(&path);
        assert_eq!(
            reopened.read_state(VM_CLIENT_ID).await.unwrap(),
            Some(sample_state())
        );
    }

    #[tokio::test]
    async fn test_corrupted_record_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let key = hex::encode("client-a");
        std::fs::write(&path, format!("{{\"{key}\": \"zz\"}}")).unwrap();

        let err = FileStateStore::new(&path)
            .read_state("client-a")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::CorruptedData { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStateStore::new();
        store
            .write_state("a", &ClientPersistentState::default())
            .await
            .unwrap();
        store.write_state("a", &sample_state()).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["a"], sample_state());
    }

    #[test]
    fn test_record_encoding_is_hex_json() {
        let encoded = encode_record(&sample_state()).unwrap();
        let json = hex::decode(&encoded).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["lastCompletionTimeMillis"], 1_700_000_000_000_i64);
        assert_eq!(decode_record("x", &encoded).unwrap(), sample_state());
    }
}
