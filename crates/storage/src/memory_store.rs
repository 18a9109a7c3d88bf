use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::{SessionStore, StorageError};

/// In-process session store, grounded in the same insert/lookup shape as a
/// simple keyed cache. Useful for tests and for single-process deployments
/// that don't need cross-restart durability.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    blobs: RwLock<HashMap<String, Value>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session_id: &str, blob: Value) -> Result<(), StorageError> {
        let mut guard = self.blobs.write().expect("session store lock poisoned");
        guard.insert(session_id.to_string(), blob);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Value, StorageError> {
        let guard = self.blobs.read().expect("session store lock poisoned");
        guard.get(session_id).cloned().ok_or_else(|| StorageError::NotFound(session_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = InMemorySessionStore::new();
        store.put("s1", json!({"turn_number": 3})).await.unwrap();
        let blob = store.get("s1").await.unwrap();
        assert_eq!(blob["turn_number"], 3);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = InMemorySessionStore::new();
        let err = store.get("missing").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
