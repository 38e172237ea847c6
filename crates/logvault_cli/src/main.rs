//! Logvault CLI
//!
//! Offline tools over local log files: the same redaction, digests and frame
//! encoding the server uses, without a running server.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use logvault_core::{Digest, StoredName, SANITIZED_SUFFIX};
use logvault_policy::{Redactor, SanitizeReport};
use logvault_stream::{FrameEncoder, FrameFormat, TailConfig, TailController, TailSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_stream::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "logvault")]
#[command(about = "Logvault - sanitize, digest and tail log files", long_about = None)]
struct Cli {
    /// Diagnostic log filter, written to stderr
    #[arg(long, global = true, env = "LOGVAULT_LOG", default_value = "logvault=warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sanitized copy of a log file
    Sanitize {
        /// Log file to sanitize
        file: PathBuf,
        /// Output path (default: <file>.sanitized)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print SHA-256 digests
    Digest {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a log file as event-stream frames
    Tail {
        /// Log file to read
        file: PathBuf,
        /// Keep reading as the file grows
        #[arg(short, long)]
        follow: bool,
        /// Frame shape: full or simple
        #[arg(long, default_value = "full")]
        format: FrameFormat,
        /// Poll interval in follow mode, in milliseconds
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Sanitize { file, output } => {
            let output = output.unwrap_or_else(|| sanitized_path(&file));
            let report = sanitize_file(&file, &output).await?;
            println!(
                "Wrote {} ({} of {} lines redacted)",
                output.display(),
                report.lines_redacted,
                report.lines_total
            );
            Ok(())
        }
        Commands::Digest { files } => {
            for file in files {
                let digest = digest_file(&file).await?;
                println!("{}  {}", digest, file.display());
            }
            Ok(())
        }
        Commands::Tail {
            file,
            follow,
            format,
            poll_ms,
        } => {
            let mut stdout = tokio::io::stdout();
            tail_file(&file, follow, FrameEncoder::new(format), poll_ms, &mut stdout).await
        }
    }
}

/// `<file>.sanitized` next to `file`
fn sanitized_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(SANITIZED_SUFFIX);
    PathBuf::from(name)
}

async fn sanitize_file(input: &Path, output: &Path) -> Result<SanitizeReport> {
    let content = tokio::fs::read_to_string(input)
        .await
        .wrap_err_with(|| format!("Failed to read {}", input.display()))?;
    let report = Redactor::new().sanitize_report(&content);
    tokio::fs::write(output, report.text.as_bytes())
        .await
        .wrap_err_with(|| format!("Failed to write {}", output.display()))?;
    info!(input = %input.display(), output = %output.display(), redacted = report.lines_redacted, "Sanitized");
    Ok(report)
}

async fn digest_file(path: &Path) -> Result<Digest> {
    let file = tokio::fs::File::open(path)
        .await
        .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
    Digest::from_async_reader(file)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path.display()))
}

async fn tail_file<W: AsyncWrite + Unpin>(
    path: &Path,
    follow: bool,
    encoder: FrameEncoder,
    poll_ms: u64,
    out: &mut W,
) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let name = StoredName::parse(file_name)
        .wrap_err_with(|| format!("Cannot tail {}", path.display()))?;

    let source = if follow {
        TailSource::Follow(path.to_path_buf())
    } else {
        let file = tokio::fs::File::open(path)
            .await
            .wrap_err_with(|| format!("Failed to open {}", path.display()))?;
        TailSource::Snapshot(Box::pin(file))
    };

    let controller = TailController::new(TailConfig {
        poll_interval: Duration::from_millis(poll_ms.max(1)),
        ..TailConfig::default()
    });
    let mut frames = std::pin::pin!(controller.open(&name, source).frames(encoder));
    while let Some(frame) = frames.next().await {
        out.write_all(&frame?).await?;
        out.flush().await?;
    }
    Ok(())
}
