use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::{SessionStore, StorageError};

/// One JSON file per session under `root_dir`. Writes go to a `.tmp`
/// sibling, `fsync`'d, then renamed over the target — a crash at any point
/// before the rename leaves the previous blob intact; a crash after leaves
/// a fully consistent new one.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self { root_dir: root_dir.into() }
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.root_dir.join(format!("{session_id}.json"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn put(&self, session_id: &str, blob: Value) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|err| StorageError::Io(err.to_string()))?;

        let final_path = self.path_for(session_id);
        let tmp_path = final_path.with_extension("json.tmp");

        let write_result: Result<(), StorageError> = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .await
                .map_err(|err| StorageError::Io(err.to_string()))?;
            let serialized =
                serde_json::to_vec(&blob).map_err(|err| StorageError::Corrupt(err.to_string()))?;
            file.write_all(&serialized).await.map_err(|err| StorageError::Io(err.to_string()))?;
            file.flush().await.map_err(|err| StorageError::Io(err.to_string()))?;
            file.sync_all().await.map_err(|err| StorageError::Io(err.to_string()))?;
            Ok(())
        }
        .await;

        if let Err(err) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|err| StorageError::Io(err.to_string()))?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Value, StorageError> {
        let path = self.path_for(session_id);
        if !path.exists() {
            return Err(StorageError::NotFound(session_id.to_string()));
        }
        let bytes =
            tokio::fs::read(&path).await.map_err(|err| StorageError::Io(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| StorageError::Corrupt(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.put("s1", json!({"interruption_count": 2})).await.unwrap();
        let blob = store.get("s1").await.unwrap();
        assert_eq!(blob["interruption_count"], 2);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn overwrite_replaces_prior_blob() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.put("s1", json!({"turn_number": 1})).await.unwrap();
        store.put("s1", json!({"turn_number": 2})).await.unwrap();
        let blob = store.get("s1").await.unwrap();
        assert_eq!(blob["turn_number"], 2);
    }
}
