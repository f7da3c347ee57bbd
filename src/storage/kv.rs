use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors surfaced by the storage layer
///
/// Store unavailability propagates to the caller unchanged; this crate
/// never retries storage operations. Retries, if desired, belong to the
/// store implementation itself.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored data could not be decoded: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Minimal get/set blob store contract
///
/// The registry treats the store as a dumb key → bytes mapping and keeps
/// all schema knowledge on its own side. The store may be shared by
/// multiple independently-running processes, which is why the registry
/// reloads before every operation instead of caching.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the blob stored under `key`, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, replacing any previous blob.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
}

/// In-memory implementation of KvStore for development and testing
///
/// Data is stored in memory and lost when the process exits. A single
/// instance can be shared between components via `Arc` to simulate a
/// store shared across writers.
pub struct InMemoryKvStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKvStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory store with pre-populated entries
    pub fn with_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Returns whether a key currently exists (useful for assertions)
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// Returns the current number of keys in the store
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns whether the store holds no keys at all
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self.entries.lock().unwrap();
        let value = entries.get(key).cloned();

        debug!(
            key = %key,
            found = value.is_some(),
            "Fetched blob from memory"
        );

        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value);

        debug!(key = %key, "Stored blob in memory");
        Ok(())
    }
}
