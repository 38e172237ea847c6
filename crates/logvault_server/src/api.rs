//! Router and shared state.

use crate::auth::require_api_key;
use crate::config::ServerConfig;
use crate::handler;
use crate::ingest::Ingestor;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use logvault_core::Variant;
use logvault_storage::{BackendKind, FsBackend, MemoryBackend, StorageBackend, StorageResult};
use logvault_stream::{FrameEncoder, TailController};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration, fixed at startup
    pub config: Arc<ServerConfig>,
    /// Storage backend
    pub backend: Arc<dyn StorageBackend>,
    /// Upload pipeline
    pub ingestor: Arc<Ingestor>,
    /// Opens content streams
    pub tail: TailController,
    /// Encodes stream frames
    pub encoder: FrameEncoder,
}

impl AppState {
    /// Build state over an already prepared backend
    #[must_use]
    pub fn new(config: ServerConfig, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            ingestor: Arc::new(Ingestor::new(backend.clone())),
            tail: TailController::new(config.tail_config()),
            encoder: config.frame_encoder(),
            config: Arc::new(config),
            backend,
        }
    }
}

/// Create the configured backend and both containers
///
/// # Errors
///
/// Returns error if the storage root or a container cannot be created
pub async fn open_backend(config: &ServerConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match config.backend {
        BackendKind::Fs => Arc::new(FsBackend::new(&config.storage_dir).await?),
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
    };
    for variant in Variant::ALL {
        backend.ensure_container(variant.container()).await?;
    }
    info!(backend = %backend.kind(), "Storage ready");
    Ok(backend)
}

/// Build the HTTP router
pub fn router(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), require_api_key);
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(handler::health))
        .route(
            "/api/logs",
            get(handler::list_logs).merge(post(handler::upload_log).route_layer(auth.clone())),
        )
        .route("/api/logs/{name}/stream", get(handler::stream_log))
        .route("/api/logs/{name}/digest", get(handler::digest_log))
        .route(
            "/api/logs/{name}/sanitize",
            post(handler::sanitize_log).route_layer(auth),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
