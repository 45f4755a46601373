//! Filesystem-backed object store.
//!
//! Serves keys as files under a root directory, e.g. a local mirror of the
//! publish bucket.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{ObjectStore, StoredObject, hash};
use crate::Error;

#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path under the root, refusing anything that is not
    /// a plain relative path.
    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        let plain = relative.components().all(|c| matches!(c, Component::Normal(_)));
        plain.then(|| self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, Error> {
        let Some(path) = self.path_for(key) else {
            tracing::debug!(key, "rejecting non-relative object key");
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let etag = Some(hash::etag_for(&bytes));
                Ok(Some(StoredObject { bytes: Bytes::from(bytes), etag }))
            }
            // A directory where a file was expected is absence, not failure.
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory | ErrorKind::NotADirectory) => {
                Ok(None)
            }
            Err(e) => Err(Error::Store(format!("{}: {e}", path.display()))),
        }
    }
}
