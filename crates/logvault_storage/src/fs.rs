//! Filesystem backend.
//!
//! Each container is a directory under a fixed root and each blob a plain
//! file, so a stored log can be followed while another process appends to it.

use crate::backend::{
    validate_blob_name, BackendKind, BlobMeta, BlobReader, StorageBackend, StorageError,
    StorageResult,
};
use async_trait::async_trait;
use bytes::Bytes;
use logvault_core::Timestamp;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Prefix of in-flight upload files; such files are never listed
const TEMP_PREFIX: &str = ".upload-";

/// Directory-tree backed store
#[derive(Debug, Clone)]
pub struct FsBackend {
    /// Root directory holding one subdirectory per container
    root: PathBuf,
}

impl FsBackend {
    /// Create a store rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns error if the root directory cannot be created
    pub async fn new<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        info!(path = %root.display(), "Initialized filesystem store");
        Ok(Self { root })
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> StorageResult<PathBuf> {
        validate_blob_name(container)?;
        Ok(self.root.join(container))
    }

    fn blob_path(&self, container: &str, name: &str) -> StorageResult<PathBuf> {
        validate_blob_name(name)?;
        Ok(self.container_dir(container)?.join(name))
    }

    fn not_found(container: &str, name: &str) -> StorageError {
        StorageError::NotFound {
            container: container.to_string(),
            name: name.to_string(),
        }
    }

    fn map_read_err(err: std::io::Error, container: &str, name: &str) -> StorageError {
        if err.kind() == ErrorKind::NotFound {
            Self::not_found(container, name)
        } else {
            StorageError::Io(err)
        }
    }
}

fn meta_from(name: String, metadata: &std::fs::Metadata) -> BlobMeta {
    let modified = metadata
        .modified()
        .map(Timestamp::from)
        .unwrap_or_default();
    BlobMeta {
        name,
        size: metadata.len(),
        modified,
    }
}

#[async_trait]
impl StorageBackend for FsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fs
    }

    async fn ensure_container(&self, container: &str) -> StorageResult<()> {
        let dir = self.container_dir(container)?;
        fs::create_dir_all(&dir).await?;
        debug!(path = %dir.display(), "Container ready");
        Ok(())
    }

    async fn put(&self, container: &str, name: &str, bytes: Bytes) -> StorageResult<BlobMeta> {
        let path = self.blob_path(container, name)?;
        let dir = self.container_dir(container)?;
        if !fs::try_exists(&dir).await? {
            return Err(StorageError::ContainerMissing(container.to_string()));
        }

        // Write next to the target, then rename into place.
        let tmp = dir.join(format!("{}{}", TEMP_PREFIX, uuid::Uuid::new_v4()));
        let write = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            fs::rename(&tmp, &path).await
        };
        if let Err(err) = write.await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(err.into());
        }

        let metadata = fs::metadata(&path).await?;
        debug!(path = %path.display(), size = metadata.len(), "Stored file");
        Ok(meta_from(name.to_string(), &metadata))
    }

    async fn get(&self, container: &str, name: &str) -> StorageResult<Bytes> {
        let path = self.blob_path(container, name)?;
        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| Self::map_read_err(e, container, name))
    }

    async fn open(&self, container: &str, name: &str) -> StorageResult<BlobReader> {
        let path = self.blob_path(container, name)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| Self::map_read_err(e, container, name))?;
        Ok(Box::pin(file))
    }

    async fn stat(&self, container: &str, name: &str) -> StorageResult<BlobMeta> {
        let path = self.blob_path(container, name)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| Self::map_read_err(e, container, name))?;
        if !metadata.is_file() {
            return Err(Self::not_found(container, name));
        }
        Ok(meta_from(name.to_string(), &metadata))
    }

    async fn list(&self, container: &str) -> StorageResult<Vec<BlobMeta>> {
        let dir = self.container_dir(container)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::ContainerMissing(container.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut blobs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                blobs.push(meta_from(name, &metadata));
            }
        }
        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }

    fn local_path(&self, container: &str, name: &str) -> Option<PathBuf> {
        self.blob_path(container, name).ok()
    }
}
