//! State store: persisted map from identity to last-applied record.
//!
//! The engine only requires the get/put/delete/list contract; the medium
//! is pluggable. Two backends ship in-repo:
//!
//! - [`InMemoryStateStore`] — default, used heavily in tests.
//! - [`JsonFileStateStore`] — one JSON document on disk, rewritten via
//!   temp file + atomic rename on every mutation so a crash never leaves
//!   a partially-written store visible.
//!
//! The store is mutated only by the executor/destroyer, strictly after
//! the corresponding hook succeeded, one identity at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use itertools::Itertools;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::{Identity, StateRecord};

/// Trait for state-store backends. All operations are keyed strictly by
/// identity; no partial matching.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Look up the record for an identity.
    async fn get(&self, identity: &Identity) -> Result<Option<StateRecord>>;

    /// Write (or overwrite) the record for an identity.
    async fn put(&self, identity: &Identity, record: StateRecord) -> Result<()>;

    /// Remove the record for an identity.
    async fn delete(&self, identity: &Identity) -> Result<()>;

    /// List identities, optionally restricted to one type name. Used by
    /// orphan detection.
    async fn list(&self, type_name: Option<&str>) -> Result<Vec<Identity>>;
}

/// In-memory state store.
#[derive(Default)]
pub struct InMemoryStateStore {
    records: RwLock<HashMap<String, StateRecord>>,
}

impl InMemoryStateStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, identity: &Identity) -> Result<Option<StateRecord>> {
        Ok(self.records.read().await.get(&identity.key()).cloned())
    }

    async fn put(&self, identity: &Identity, record: StateRecord) -> Result<()> {
        self.records.write().await.insert(identity.key(), record);
        Ok(())
    }

    async fn delete(&self, identity: &Identity) -> Result<()> {
        self.records.write().await.remove(&identity.key());
        Ok(())
    }

    async fn list(&self, type_name: Option<&str>) -> Result<Vec<Identity>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| type_name.is_none_or(|t| r.identity.type_name == t))
            .map(|r| r.identity.clone())
            .sorted_by_key(Identity::key)
            .collect())
    }
}

/// File-backed state store holding the whole map in one JSON document.
pub struct JsonFileStateStore {
    path: PathBuf,
    records: RwLock<HashMap<String, StateRecord>>,
}

impl JsonFileStateStore {
    /// Open (or initialize) a store at the given path. An existing file
    /// is loaded; a missing one starts empty and is created on the first
    /// mutation.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(Error::Io(err)),
        };
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, records: &HashMap<String, StateRecord>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn get(&self, identity: &Identity) -> Result<Option<StateRecord>> {
        Ok(self.records.read().await.get(&identity.key()).cloned())
    }

    async fn put(&self, identity: &Identity, record: StateRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(identity.key(), record);
        self.persist(&records).await
    }

    async fn delete(&self, identity: &Identity) -> Result<()> {
        let mut records = self.records.write().await;
        records.remove(&identity.key());
        self.persist(&records).await
    }

    async fn list(&self, type_name: Option<&str>) -> Result<Vec<Identity>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| type_name.is_none_or(|t| r.identity.type_name == t))
            .map(|r| r.identity.clone())
            .sorted_by_key(Identity::key)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::types::Digest;
    use sha2::{Digest as _, Sha256};

    fn identity(label: &str) -> Identity {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        Identity::new("task", label, Digest::from_bytes(hasher.finalize().into()))
    }

    fn record(label: &str) -> StateRecord {
        let id = identity(label);
        let digest = id.breaking_digest;
        StateRecord::new(id, digest, Vec::new())
    }

    #[tokio::test]
    async fn test_in_memory_get_put_delete() {
        let store = InMemoryStateStore::new();
        let id = identity("a");

        assert!(store.get(&id).await.unwrap().is_none());
        store.put(&id, record("a")).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_some());
        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_scoped_by_type() {
        let store = InMemoryStateStore::new();
        store.put(&identity("a"), record("a")).await.unwrap();
        store.put(&identity("b"), record("b")).await.unwrap();

        assert_eq!(store.list(Some("task")).await.unwrap().len(), 2);
        assert!(store.list(Some("other")).await.unwrap().is_empty());
        assert_eq!(store.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = JsonFileStateStore::open(&path).await.unwrap();
            store.put(&identity("a"), record("a")).await.unwrap();
        }

        let store = JsonFileStateStore::open(&path).await.unwrap();
        let found = store.get(&identity("a")).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().identity.label, "a");
    }

    #[tokio::test]
    async fn test_json_file_store_delete_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStateStore::open(&path).await.unwrap();
        store.put(&identity("a"), record("a")).await.unwrap();
        store.delete(&identity("a")).await.unwrap();
        drop(store);

        let store = JsonFileStateStore::open(&path).await.unwrap();
        assert!(store.get(&identity("a")).await.unwrap().is_none());
    }
}
