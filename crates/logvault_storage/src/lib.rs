//! Logvault Storage
//!
//! Named blobs grouped into named containers. The service keeps originals and
//! sanitized copies in two containers and never addresses blobs by content.
//! Two backends are provided: a local directory tree and an in-process
//! object store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod fs;
pub mod memory;

pub use backend::{
    validate_blob_name, BackendKind, BlobMeta, BlobReader, StorageBackend, StorageError,
    StorageResult,
};
pub use fs::FsBackend;
pub use memory::MemoryBackend;
