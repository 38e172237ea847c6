//! Storage backend interface.

use async_trait::async_trait;
use bytes::Bytes;
use logvault_core::{CoreError, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

/// Streaming handle on a stored blob
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Which backend implementation is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Directory tree on the local filesystem
    Fs,
    /// In-process object store
    Memory,
}

impl BackendKind {
    /// Lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fs => "fs",
            Self::Memory => "memory",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fs" => Ok(Self::Fs),
            "memory" => Ok(Self::Memory),
            other => Err(CoreError::validation(
                "backend",
                format!("unknown backend '{other}', expected 'fs' or 'memory'"),
            )),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a stored blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobMeta {
    /// Blob name within its container
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: Timestamp,
}

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Blob not found
    #[error("Blob not found: {container}/{name}")]
    NotFound {
        /// Container that was searched
        container: String,
        /// Blob name
        name: String,
    },

    /// Container was never created
    #[error("Container does not exist: {0}")]
    ContainerMissing(String),

    /// Name is not a single safe path component
    #[error("Invalid blob name: {0}")]
    InvalidName(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend cannot serve requests
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether this error means the blob is absent
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { name, .. } => CoreError::not_found("Log", name),
            StorageError::InvalidName(name) => CoreError::validation("filename", name),
            other => CoreError::storage("storage", other.to_string()),
        }
    }
}

/// Reject names that could escape a container
///
/// # Errors
///
/// Returns `StorageError::InvalidName` for empty names, `.`/`..`, or names
/// containing separators or NUL
pub fn validate_blob_name(name: &str) -> StorageResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Named blob storage grouped into containers
///
/// The core consumes this interface; it never holds file content beyond a
/// single request.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which implementation this is
    fn kind(&self) -> BackendKind;

    /// Create a container if it does not exist
    async fn ensure_container(&self, container: &str) -> StorageResult<()>;

    /// Store bytes under `name`, replacing any existing blob
    async fn put(&self, container: &str, name: &str, bytes: Bytes) -> StorageResult<BlobMeta>;

    /// Read a whole blob
    async fn get(&self, container: &str, name: &str) -> StorageResult<Bytes>;

    /// Open a blob for streaming reads
    ///
    /// The default buffers the result of [`StorageBackend::get`].
    async fn open(&self, container: &str, name: &str) -> StorageResult<BlobReader> {
        let bytes = self.get(container, name).await?;
        Ok(Box::pin(std::io::Cursor::new(bytes)))
    }

    /// Metadata for a single blob
    async fn stat(&self, container: &str, name: &str) -> StorageResult<BlobMeta>;

    /// Whether a blob exists
    async fn exists(&self, container: &str, name: &str) -> StorageResult<bool> {
        match self.stat(container, name).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// All blobs in a container, ordered by name
    async fn list(&self, container: &str) -> StorageResult<Vec<BlobMeta>>;

    /// Local path of a blob, for backends that keep blobs as plain files
    ///
    /// Only such backends support following a growing file.
    fn local_path(&self, _container: &str, _name: &str) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_blob_name() {
        assert!(validate_blob_name("app.log").is_ok());
        assert!(validate_blob_name("app.log.sanitized").is_ok());
        assert!(validate_blob_name("").is_err());
        assert!(validate_blob_name("..").is_err());
        assert!(validate_blob_name("a/b").is_err());
        assert!(validate_blob_name("a\\b").is_err());
    }

    #[test]
    fn test_not_found_maps_to_core_not_found() {
        let err = StorageError::NotFound {
            container: "logs-original".to_string(),
            name: "a.log".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(CoreError::from(err), CoreError::not_found("Log", "a.log"));
    }

    #[test]
    fn test_io_maps_to_core_storage() {
        let err = StorageError::from(std::io::Error::other("disk on fire"));
        assert!(!err.is_not_found());
        assert!(matches!(CoreError::from(err), CoreError::Storage { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::ContainerMissing("logs-original".to_string());
        assert!(err.to_string().contains("logs-original"));
    }

    #[test]
    fn test_backend_kind_serde() {
        assert_eq!(serde_json::to_string(&BackendKind::Fs).unwrap(), "\"fs\"");
        assert_eq!(BackendKind::Memory.to_string(), "memory");
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("FS".parse::<BackendKind>().unwrap(), BackendKind::Fs);
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert!("s3".parse::<BackendKind>().is_err());
    }
}
