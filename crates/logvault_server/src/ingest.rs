//! Upload ingestion.
//!
//! Order is fixed: validate and sanitize in memory, store the original, then
//! store the sanitized copy. Nothing is written for invalid input, and a
//! sanitized copy is never written unless the original was.

use bytes::Bytes;
use logvault_core::{CoreError, Digest, LogName, Variant};
use logvault_policy::Redactor;
use logvault_storage::{StorageBackend, StorageError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Result of storing one log and its sanitized copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Stored original name
    pub filename: String,
    /// Stored sanitized name
    pub sanitized_filename: String,
    /// SHA-256 of the original bytes
    pub original_sha256: Digest,
    /// SHA-256 of the sanitized bytes
    pub sanitized_sha256: Digest,
    /// Original size in bytes
    pub size: u64,
    /// Lines in the original
    pub lines_total: usize,
    /// Lines replaced in the sanitized copy
    pub lines_redacted: usize,
}

/// Ingestion failure, by stage
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Content rejected before any write
    #[error("{0}")]
    Invalid(CoreError),

    /// Storing the original failed; nothing was kept
    #[error("Failed to store {filename}: {source}")]
    OriginalWrite {
        /// Original name
        filename: String,
        /// Backend error
        source: StorageError,
    },

    /// The original was kept but its sanitized copy could not be stored
    #[error("Stored {filename} but failed to store its sanitized copy: {source}")]
    SanitizedWrite {
        /// Original name, still present in storage
        filename: String,
        /// Backend error
        source: StorageError,
    },
}

impl IngestError {
    /// Write stage that failed, if any
    #[must_use]
    pub const fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Invalid(_) => None,
            Self::OriginalWrite { .. } => Some("original"),
            Self::SanitizedWrite { .. } => Some("sanitized"),
        }
    }

    /// Name of the upload concerned
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Invalid(_) => None,
            Self::OriginalWrite { filename, .. } | Self::SanitizedWrite { filename, .. } => {
                Some(filename)
            }
        }
    }
}

/// Stores uploads as original plus sanitized copy
pub struct Ingestor {
    backend: Arc<dyn StorageBackend>,
    redactor: Redactor,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("backend", &self.backend.kind())
            .finish_non_exhaustive()
    }
}

impl Ingestor {
    /// Create an ingestor over a backend
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            redactor: Redactor::new(),
        }
    }

    /// Store `bytes` as `name` and its sanitized copy
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Invalid` for non UTF-8 content (no writes),
    /// `OriginalWrite` if the first write fails and `SanitizedWrite` if only
    /// the second does
    pub async fn ingest(&self, name: &LogName, bytes: Bytes) -> Result<IngestReport, IngestError> {
        let text = std::str::from_utf8(&bytes).map_err(|e| {
            IngestError::Invalid(CoreError::validation(
                "file",
                format!("{name} is not UTF-8 text: {e}"),
            ))
        })?;
        let report = self.redactor.sanitize_report(text);
        let sanitized = Bytes::from(report.text);

        let original_sha256 = Digest::compute(&bytes);
        let sanitized_sha256 = Digest::compute(&sanitized);
        let size = bytes.len() as u64;

        self.backend
            .put(Variant::Original.container(), name.as_str(), bytes)
            .await
            .map_err(|source| {
                error!(operation = "ingest", filename = %name, stage = "original", error = %source, "Write failed");
                IngestError::OriginalWrite {
                    filename: name.to_string(),
                    source,
                }
            })?;

        let sanitized_filename = name.sanitized();
        self.backend
            .put(Variant::Sanitized.container(), &sanitized_filename, sanitized)
            .await
            .map_err(|source| {
                error!(operation = "ingest", filename = %name, stage = "sanitized", error = %source, "Write failed, original kept");
                IngestError::SanitizedWrite {
                    filename: name.to_string(),
                    source,
                }
            })?;

        info!(
            filename = %name,
            size,
            lines = report.lines_total,
            redacted = report.lines_redacted,
            "Ingested log"
        );

        Ok(IngestReport {
            filename: name.to_string(),
            sanitized_filename,
            original_sha256,
            sanitized_sha256,
            size,
            lines_total: report.lines_total,
            lines_redacted: report.lines_redacted,
        })
    }

    /// Create the missing sanitized copy of a stored original
    ///
    /// Repairs the state left by a failed sanitized write. An existing
    /// sanitized copy is never replaced.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the original is absent, `AlreadyExists` if the
    /// sanitized copy is present, or a storage error
    pub async fn repair(&self, name: &LogName) -> Result<IngestReport, CoreError> {
        let sanitized_filename = name.sanitized();
        if self
            .backend
            .exists(Variant::Sanitized.container(), &sanitized_filename)
            .await?
        {
            return Err(CoreError::AlreadyExists {
                kind: "Sanitized log".to_string(),
                id: sanitized_filename,
            });
        }

        let bytes = self
            .backend
            .get(Variant::Original.container(), name.as_str())
            .await?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| CoreError::validation("file", format!("{name} is not UTF-8 text: {e}")))?;
        let report = self.redactor.sanitize_report(text);
        let sanitized = Bytes::from(report.text);
        let sanitized_sha256 = Digest::compute(&sanitized);

        self.backend
            .put(Variant::Sanitized.container(), &sanitized_filename, sanitized)
            .await?;
        info!(filename = %name, redacted = report.lines_redacted, "Repaired sanitized copy");

        Ok(IngestReport {
            filename: name.to_string(),
            sanitized_filename,
            original_sha256: Digest::compute(&bytes),
            sanitized_sha256,
            size: bytes.len() as u64,
            lines_total: report.lines_total,
            lines_redacted: report.lines_redacted,
        })
    }
}
