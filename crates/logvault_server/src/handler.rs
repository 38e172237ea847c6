//! Route handlers.

use crate::api::AppState;
use crate::error::ApiError;
use crate::gateway::read_upload;
use crate::ingest::IngestReport;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use logvault_core::{Digest, LogName, StoredName, Timestamp, Variant};
use logvault_storage::{BlobMeta, StorageError};
use logvault_stream::{TailMode, TailSource, EVENT_STREAM_CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Health response
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "backend": state.backend.kind(),
    }))
}

/// One stored file in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Stored name
    pub name: String,
    /// Which copy
    #[serde(rename = "type")]
    pub variant: Variant,
    /// Last modification time
    pub timestamp: Timestamp,
    /// Size in bytes
    pub size: u64,
}

impl LogEntry {
    fn from_meta(meta: BlobMeta, variant: Variant) -> Self {
        Self {
            name: meta.name,
            variant,
            timestamp: meta.modified,
            size: meta.size,
        }
    }
}

/// `GET /api/logs`: both containers, newest first
///
/// # Errors
///
/// Returns a storage error if a container cannot be listed
pub async fn list_logs(State(state): State<AppState>) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let mut entries = Vec::new();
    for variant in Variant::ALL {
        let blobs = match state.backend.list(variant.container()).await {
            Ok(blobs) => blobs,
            Err(StorageError::ContainerMissing(_)) => Vec::new(),
            Err(e) => {
                warn!(operation = "list", container = variant.container(), error = %e, "List failed");
                return Err(e.into());
            }
        };
        entries.extend(blobs.into_iter().map(|meta| LogEntry::from_meta(meta, variant)));
    }
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.name.cmp(&b.name)));
    Ok(Json(entries))
}

/// `POST /api/logs`: store an upload and its sanitized copy
///
/// # Errors
///
/// Returns a validation error before any write, or an ingest error naming
/// the failed stage
pub async fn upload_log(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes)
        .await
        .inspect_err(|e| warn!(operation = "upload", error = %e, "Upload rejected"))?;

    let report = state
        .ingestor
        .ingest(&upload.name, upload.bytes)
        .await
        .inspect_err(|e| warn!(operation = "upload", filename = %upload.name, error = %e, "Ingest failed"))?;
    Ok(Json(report))
}

/// Query of the stream route
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    /// Keep reading after the end; ignored unless the backend has local files
    pub follow: Option<bool>,
}

/// `GET /api/logs/{name}/stream`: content as `text/event-stream` frames
///
/// # Errors
///
/// Returns not-found before any frame is sent if the file is absent
pub async fn stream_log(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, ApiError> {
    let stored = StoredName::parse(&name)
        .inspect_err(|e| warn!(operation = "stream", filename = %name, error = %e, "Invalid log name"))?;
    let container = stored.container();
    let file_name = stored.file_name();

    state
        .backend
        .stat(container, &file_name)
        .await
        .inspect_err(|e| warn!(operation = "stream", filename = %file_name, error = %e, "Cannot open log"))?;

    let local = state.backend.local_path(container, &file_name);
    let source = match local {
        Some(path) if query.follow != Some(false) => TailSource::Follow(path),
        _ => TailSource::Snapshot(
            state
                .backend
                .open(container, &file_name)
                .await
                .inspect_err(|e| warn!(operation = "stream", filename = %file_name, error = %e, "Cannot open log"))?,
        ),
    };

    let handle = state.tail.open(&stored, source);
    info!(
        filename = %file_name,
        follow = handle.mode() == TailMode::Follow,
        "Streaming log"
    );

    Ok((
        [
            (header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(handle.frames(state.encoder)),
    )
        .into_response())
}

/// On-demand digest of one stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDigest {
    /// Stored name
    pub name: String,
    /// Which copy
    #[serde(rename = "type")]
    pub variant: Variant,
    /// SHA-256 of the stored bytes
    pub sha256: Digest,
    /// Size in bytes
    pub size: u64,
}

/// `GET /api/logs/{name}/digest`
///
/// # Errors
///
/// Returns not-found if the file is absent
pub async fn digest_log(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<FileDigest>, ApiError> {
    let stored = StoredName::parse(&name)
        .inspect_err(|e| warn!(operation = "digest", filename = %name, error = %e, "Invalid log name"))?;
    let file_name = stored.file_name();
    let open = async {
        let meta = state.backend.stat(stored.container(), &file_name).await?;
        let reader = state.backend.open(stored.container(), &file_name).await?;
        Ok::<_, StorageError>((meta, reader))
    };
    let (meta, reader) = open
        .await
        .inspect_err(|e| warn!(operation = "digest", filename = %file_name, error = %e, "Cannot open log"))?;

    let sha256 = Digest::from_async_reader(reader).await.map_err(|e| {
        warn!(operation = "digest", filename = %file_name, error = %e, "Read failed");
        ApiError::Storage(format!("Failed to read {file_name}: {e}"))
    })?;

    Ok(Json(FileDigest {
        name: file_name,
        variant: stored.variant(),
        sha256,
        size: meta.size,
    }))
}

/// `POST /api/logs/{name}/sanitize`: create a missing sanitized copy
///
/// # Errors
///
/// Returns not-found without an original, conflict if the copy exists
pub async fn sanitize_log(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<IngestReport>, ApiError> {
    let name = LogName::parse(&name)
        .inspect_err(|e| warn!(operation = "sanitize", filename = %name, error = %e, "Invalid log name"))?;
    let report = state
        .ingestor
        .repair(&name)
        .await
        .inspect_err(|e| warn!(operation = "sanitize", filename = %name, error = %e, "Repair refused"))?;
    Ok(Json(report))
}
