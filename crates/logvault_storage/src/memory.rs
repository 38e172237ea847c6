//! In-process object store.
//!
//! Behaves like a cloud blob service with flat named containers: whole-object
//! reads, no local paths, so streams from it are always snapshots.

use crate::backend::{
    validate_blob_name, BackendKind, BlobMeta, StorageBackend, StorageError, StorageResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use logvault_core::Timestamp;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Total number of blobs
    pub blob_count: usize,
    /// Total bytes stored
    pub total_bytes: u64,
    /// Number of reads
    pub read_count: u64,
    /// Number of writes
    pub write_count: u64,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    modified: Timestamp,
}

impl StoredObject {
    fn meta(&self, name: &str) -> BlobMeta {
        BlobMeta {
            name: name.to_string(),
            size: self.data.len() as u64,
            modified: self.modified,
        }
    }
}

type Containers = HashMap<String, BTreeMap<String, StoredObject>>;

/// In-memory container store
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// Objects per container, ordered by name
    containers: RwLock<Containers>,
    /// Store statistics
    stats: RwLock<StoreStats>,
}

impl MemoryBackend {
    /// Create an empty store with no containers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get store statistics
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the store lock is poisoned
    pub fn stats(&self) -> StorageResult<StoreStats> {
        Ok(self
            .stats
            .read()
            .map_err(|_| poisoned())?
            .clone())
    }

    fn read_containers(&self) -> StorageResult<RwLockReadGuard<'_, Containers>> {
        self.containers.read().map_err(|_| poisoned())
    }

    fn write_containers(&self) -> StorageResult<RwLockWriteGuard<'_, Containers>> {
        self.containers.write().map_err(|_| poisoned())
    }

    fn record(&self, update: impl FnOnce(&mut StoreStats)) -> StorageResult<()> {
        let mut stats = self.stats.write().map_err(|_| poisoned())?;
        update(&mut stats);
        Ok(())
    }

    fn object(&self, container: &str, name: &str) -> StorageResult<StoredObject> {
        let containers = self.read_containers()?;
        containers
            .get(container)
            .ok_or_else(|| StorageError::ContainerMissing(container.to_string()))?
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                container: container.to_string(),
                name: name.to_string(),
            })
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn ensure_container(&self, container: &str) -> StorageResult<()> {
        validate_blob_name(container)?;
        self.write_containers()?
            .entry(container.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, container: &str, name: &str, bytes: Bytes) -> StorageResult<BlobMeta> {
        validate_blob_name(name)?;
        let object = StoredObject {
            data: bytes,
            modified: Timestamp::now(),
        };
        let meta = object.meta(name);

        let previous = {
            let mut containers = self.write_containers()?;
            let objects = containers
                .get_mut(container)
                .ok_or_else(|| StorageError::ContainerMissing(container.to_string()))?;
            objects.insert(name.to_string(), object)
        };

        self.record(|stats| {
            if let Some(old) = &previous {
                stats.total_bytes -= old.data.len() as u64;
            } else {
                stats.blob_count += 1;
            }
            stats.total_bytes += meta.size;
            stats.write_count += 1;
        })?;

        debug!(container, name, size = meta.size, "Stored object");
        Ok(meta)
    }

    async fn get(&self, container: &str, name: &str) -> StorageResult<Bytes> {
        validate_blob_name(name)?;
        let object = self.object(container, name)?;
        self.record(|stats| stats.read_count += 1)?;
        Ok(object.data)
    }

    async fn stat(&self, container: &str, name: &str) -> StorageResult<BlobMeta> {
        validate_blob_name(name)?;
        Ok(self.object(container, name)?.meta(name))
    }

    async fn list(&self, container: &str) -> StorageResult<Vec<BlobMeta>> {
        let containers = self.read_containers()?;
        let objects = containers
            .get(container)
            .ok_or_else(|| StorageError::ContainerMissing(container.to_string()))?;
        Ok(objects
            .iter()
            .map(|(name, object)| object.meta(name))
            .collect())
    }
}
