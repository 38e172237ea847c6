//! Logvault Core Types
//!
//! This crate contains pure types and logic with no network I/O.
//! Log names, variants, digests and timestamps are shared by every other crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod name;
pub mod time;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use hash::{Digest, DigestWriter, HashError, CHUNK_SIZE};
pub use name::{LogName, StoredName, Variant, ALLOWED_EXTENSIONS, SANITIZED_SUFFIX};
pub use time::Timestamp;
