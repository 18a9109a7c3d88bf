//! Durable storage for serialized sessions (spec §6 "Session persistence
//! collaborator"): `put(session_id, blob)` / `get(session_id) -> blob |
//! not_found`. The blob is whatever [`tutorloom_conversation`]'s
//! `serialize()` produced — this crate treats it as an opaque JSON value
//! and claims no structure over it.

mod file_store;
mod memory_store;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use file_store::FileSessionStore;
pub use memory_store::InMemorySessionStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("storage io error: {0}")]
    Io(String),
    #[error("stored blob was not valid JSON: {0}")]
    Corrupt(String),
}

/// The session persistence collaborator (spec §6).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, session_id: &str, blob: Value) -> Result<(), StorageError>;
    async fn get(&self, session_id: &str) -> Result<Value, StorageError>;
}
