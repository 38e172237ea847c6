//! Server configuration.
//!
//! Built once at startup: defaults, then an optional TOML file, then
//! command-line flags and `LOGVAULT_*` environment variables.

use clap::Parser;
use logvault_core::{CoreError, CoreResult};
use logvault_storage::BackendKind;
use logvault_stream::{FrameEncoder, FrameFormat, TailConfig};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line flags; every value overrides the config file
#[derive(Parser, Debug, Default)]
#[command(name = "logvault-server")]
#[command(about = "Log ingestion service with sanitized copies and live tail", long_about = None)]
pub struct ServerArgs {
    /// Path to a TOML config file
    #[arg(short, long, env = "LOGVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind address
    #[arg(short, long, env = "LOGVAULT_BIND")]
    pub bind: Option<String>,

    /// Storage backend: fs or memory
    #[arg(long, env = "LOGVAULT_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Root directory of the filesystem backend
    #[arg(long, env = "LOGVAULT_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Shared secret required in the X-API-Key header for writes
    #[arg(long, env = "LOGVAULT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Follow-mode poll interval in milliseconds
    #[arg(long, env = "LOGVAULT_FOLLOW_POLL_MS")]
    pub follow_poll_ms: Option<u64>,

    /// Frame shape: full or simple
    #[arg(long, env = "LOGVAULT_FRAME_FORMAT")]
    pub frame_format: Option<FrameFormat>,

    /// Largest accepted upload body in bytes
    #[arg(long, env = "LOGVAULT_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Events buffered per stream
    #[arg(long, env = "LOGVAULT_STREAM_BUFFER")]
    pub stream_buffer: Option<usize>,

    /// Emit logs as JSON
    #[arg(long, env = "LOGVAULT_LOG_JSON")]
    pub log_json: bool,
}

/// Server configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind: String,
    /// Storage backend
    pub backend: BackendKind,
    /// Root directory of the filesystem backend
    pub storage_dir: PathBuf,
    /// Shared secret gating writes; `None` leaves writes open
    #[serde(deserialize_with = "deserialize_api_key")]
    pub api_key: Option<SecretString>,
    /// Follow-mode poll interval in milliseconds
    pub follow_poll_ms: u64,
    /// Frame shape
    pub frame_format: FrameFormat,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
    /// Events buffered per stream
    pub stream_buffer: usize,
    /// Emit logs as JSON
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            backend: BackendKind::Fs,
            storage_dir: PathBuf::from("./logs"),
            api_key: None,
            follow_poll_ms: 250,
            frame_format: FrameFormat::Full,
            max_upload_bytes: 16 * 1024 * 1024,
            stream_buffer: 64,
            log_json: false,
        }
    }
}

fn deserialize_api_key<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let key: Option<String> = Option::deserialize(deserializer)?;
    Ok(key.filter(|k| !k.is_empty()).map(SecretString::from))
}

impl ServerConfig {
    /// Read a TOML config file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::validation("config", format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML config text
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` on malformed TOML
    pub fn from_toml(content: &str) -> CoreResult<Self> {
        toml::from_str(content).map_err(|e| CoreError::validation("config", e.to_string()))
    }

    /// Resolve the final configuration from flags and an optional config file
    ///
    /// # Errors
    ///
    /// Returns error if the config file is unreadable or the result is invalid
    pub fn from_args(args: ServerArgs) -> CoreResult<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(args);
        config.validate()?;
        Ok(config)
    }

    /// Apply flag overrides
    pub fn apply(&mut self, args: ServerArgs) {
        if let Some(bind) = args.bind {
            self.bind = bind;
        }
        if let Some(backend) = args.backend {
            self.backend = backend;
        }
        if let Some(dir) = args.storage_dir {
            self.storage_dir = dir;
        }
        if let Some(key) = args.api_key.filter(|k| !k.is_empty()) {
            self.api_key = Some(SecretString::from(key));
        }
        if let Some(ms) = args.follow_poll_ms {
            self.follow_poll_ms = ms;
        }
        if let Some(format) = args.frame_format {
            self.frame_format = format;
        }
        if let Some(limit) = args.max_upload_bytes {
            self.max_upload_bytes = limit;
        }
        if let Some(buffer) = args.stream_buffer {
            self.stream_buffer = buffer;
        }
        self.log_json |= args.log_json;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` naming the first bad field
    pub fn validate(&self) -> CoreResult<()> {
        if self.bind.trim().is_empty() {
            return Err(CoreError::validation("bind", "must not be empty"));
        }
        if self.follow_poll_ms == 0 {
            return Err(CoreError::validation("follow_poll_ms", "must be at least 1"));
        }
        if self.stream_buffer == 0 {
            return Err(CoreError::validation("stream_buffer", "must be at least 1"));
        }
        if self.max_upload_bytes == 0 {
            return Err(CoreError::validation("max_upload_bytes", "must be at least 1"));
        }
        Ok(())
    }

    /// Tail settings derived from this config
    #[must_use]
    pub fn tail_config(&self) -> TailConfig {
        TailConfig {
            poll_interval: Duration::from_millis(self.follow_poll_ms),
            buffer: self.stream_buffer,
        }
    }

    /// Frame encoder derived from this config
    #[must_use]
    pub fn frame_encoder(&self) -> FrameEncoder {
        FrameEncoder::new(self.frame_format)
    }
}
