//! Logvault Server
//!
//! HTTP service for uploading, sanitizing and live-tailing log files.

#![warn(missing_docs)]
#![warn(clippy::all)]

use anyhow::{Context, Result};
use clap::Parser;
use logvault_server::{open_backend, router, AppState, ServerArgs, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "logvault=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();
    let config = ServerConfig::from_args(args).context("invalid configuration")?;

    init_tracing(config.log_json);

    let backend = open_backend(&config)
        .await
        .context("failed to open storage backend")?;
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        bind = %config.bind,
        backend = %config.backend,
        auth = config.api_key.is_some(),
        follow_poll_ms = config.follow_poll_ms,
        "Logvault server listening"
    );

    let app = router(AppState::new(config, backend));
    // Follow streams never finish on their own, so no graceful drain.
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
