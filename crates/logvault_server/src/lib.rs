//! Logvault Server
//!
//! HTTP service that accepts uploaded logs, stores each original next to a
//! sanitized copy, and serves both as live-tail event streams.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod ingest;

pub use api::{open_backend, router, AppState};
pub use auth::API_KEY_HEADER;
pub use config::{ServerArgs, ServerConfig};
pub use error::ApiError;
pub use gateway::Upload;
pub use ingest::{IngestError, IngestReport, Ingestor};
