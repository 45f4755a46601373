//! Object store port.
//!
//! Published artifacts are read-only from the edge's point of view: the
//! store is addressed by `sites/{siteId}/{path}` keys and answers with the
//! bytes plus an optional integrity tag, or with absence.

pub mod fs;
pub mod hash;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::Error;

pub use fs::FsObjectStore;

/// Bytes read from the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub etag: Option<String>,
}

/// Read access to a bulk object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the object at `key`; `Ok(None)` when it does not exist.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Error>;
}

/// Object store held entirely in memory.
///
/// Useful for fixtures and tests; ETags are computed on insert.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, key: impl Into<String>, bytes: impl Into<Bytes>) {
        let bytes = bytes.into();
        let etag = Some(hash::etag_for(&bytes));
        self.objects.write().await.insert(key.into(), StoredObject { bytes, etag });
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Error> {
        Ok(self.objects.read().await.get(key).cloned())
    }
}
