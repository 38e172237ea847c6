//! Tail and follow controller.
//!
//! Each opened log gets one producer task that reads content, splits it into
//! lines and sends one [`StreamEvent`] per non-blank line into a bounded
//! channel. The transport drains the channel; when it drops the receiver the
//! producer stops at its next send or poll.

use crate::cursor::Cursor;
use crate::encoding::FrameEncoder;
use crate::event::StreamEvent;
use crate::lines::{is_blank, LineBuffer};
use bytes::Bytes;
use logvault_core::{CoreResult, StoredName};
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

/// Bytes read per call
const READ_CHUNK: usize = 8192;

/// How content is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailMode {
    /// Read to the end once, then finish
    Snapshot,
    /// Read to the end, then keep polling for appended lines
    Follow,
}

/// Where a tail reads from
pub enum TailSource {
    /// A reader consumed once to its end
    Snapshot(Pin<Box<dyn AsyncRead + Send>>),
    /// A local file that may keep growing
    Follow(PathBuf),
}

impl TailSource {
    /// Mode this source implies
    #[must_use]
    pub const fn mode(&self) -> TailMode {
        match self {
            Self::Snapshot(_) => TailMode::Snapshot,
            Self::Follow(_) => TailMode::Follow,
        }
    }
}

impl std::fmt::Debug for TailSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snapshot(_) => f.write_str("Snapshot(..)"),
            Self::Follow(path) => f.debug_tuple("Follow").field(path).finish(),
        }
    }
}

/// Tail configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailConfig {
    /// Wait between end-of-file checks in follow mode
    pub poll_interval: Duration,
    /// Events buffered between producer and transport
    pub buffer: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            buffer: 64,
        }
    }
}

/// Opens tails
#[derive(Debug, Clone, Default)]
pub struct TailController {
    config: TailConfig,
}

impl TailController {
    /// Create a controller
    #[must_use]
    pub const fn new(config: TailConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &TailConfig {
        &self.config
    }

    /// Start streaming `name` from `source`
    ///
    /// Must be called from within a tokio runtime. Events carry
    /// `redacted = true` iff `name` denotes the sanitized copy.
    #[must_use]
    pub fn open(&self, name: &StoredName, source: TailSource) -> TailHandle {
        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));
        let producer = Producer {
            name: name.file_name(),
            redacted: name.is_sanitized(),
            tx,
        };
        let mode = source.mode();
        debug!(name = %producer.name, ?mode, "Opening tail");

        let task = match source {
            TailSource::Snapshot(reader) => tokio::spawn(producer.snapshot(reader)),
            TailSource::Follow(path) => {
                tokio::spawn(producer.follow(path, self.config.poll_interval))
            }
        };

        TailHandle { rx, mode, task }
    }
}

/// Consumer side of an open tail
#[derive(Debug)]
pub struct TailHandle {
    rx: mpsc::Receiver<StreamEvent>,
    mode: TailMode,
    task: JoinHandle<()>,
}

impl TailHandle {
    /// Mode of the producer
    #[must_use]
    pub const fn mode(&self) -> TailMode {
        self.mode
    }

    /// Next event, or `None` once the producer has finished
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Stop consuming
    ///
    /// Returns the producer task so callers can wait for it to exit.
    pub fn cancel(self) -> JoinHandle<()> {
        drop(self.rx);
        self.task
    }

    /// Events as a stream
    #[must_use]
    pub fn into_stream(self) -> ReceiverStream<StreamEvent> {
        ReceiverStream::new(self.rx)
    }

    /// Events encoded as frames, in order
    pub fn frames(self, encoder: FrameEncoder) -> impl Stream<Item = CoreResult<Bytes>> + Send {
        self.into_stream().map(move |event| encoder.encode(&event))
    }
}

struct Producer {
    name: String,
    redacted: bool,
    tx: mpsc::Sender<StreamEvent>,
}

impl Producer {
    /// Send a line; `false` once the consumer is gone
    async fn emit(&self, line: String) -> bool {
        if is_blank(&line) {
            return true;
        }
        self.tx.send(StreamEvent::line(line, self.redacted)).await.is_ok()
    }

    async fn emit_all(&self, lines: Vec<String>) -> bool {
        for line in lines {
            if !self.emit(line).await {
                return false;
            }
        }
        true
    }

    /// Terminal error event; the sequence ends after it
    async fn fail(&self, message: String) {
        warn!(name = %self.name, error = %message, "Tail stopped on error");
        let _ = self.tx.send(StreamEvent::error(message, self.redacted)).await;
    }

    async fn snapshot(self, mut reader: Pin<Box<dyn AsyncRead + Send>>) {
        let mut lines = LineBuffer::new();
        let mut chunk = vec![0u8; READ_CHUNK];

        loop {
            let n = match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    self.fail(format!("Failed to read {}: {}", self.name, e)).await;
                    return;
                }
            };
            if !self.emit_all(lines.push(&chunk[..n])).await {
                debug!(name = %self.name, "Consumer closed during snapshot");
                return;
            }
        }

        if let Some(line) = lines.take_partial() {
            self.emit(line).await;
        }
        debug!(name = %self.name, "Snapshot complete");
    }

    async fn follow(self, path: PathBuf, poll_interval: Duration) {
        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                self.fail(format!("Failed to open {}: {}", self.name, e)).await;
                return;
            }
        };
        let mut cursor = Cursor::new();
        let mut lines = LineBuffer::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        // A partial line is flushed once a full poll passes without more data.
        let mut partial_idle = false;

        loop {
            match file.read(&mut chunk).await {
                Ok(0) => {}
                Ok(n) => {
                    cursor.advance(n as u64);
                    partial_idle = false;
                    if !self.emit_all(lines.push(&chunk[..n])).await {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    self.fail(format!("Failed to read {}: {}", self.name, e)).await;
                    return;
                }
            }

            if lines.has_partial() {
                if partial_idle {
                    if let Some(line) = lines.take_partial() {
                        if !self.emit(line).await {
                            break;
                        }
                    }
                    partial_idle = false;
                } else {
                    partial_idle = true;
                }
            }

            let current = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) => {
                    self.fail(format!("Lost {}: {}", self.name, e)).await;
                    return;
                }
            };
            let opened = match file.metadata().await {
                Ok(meta) => meta,
                Err(e) => {
                    self.fail(format!("Failed to stat {}: {}", self.name, e)).await;
                    return;
                }
            };
            let len = current.len();
            let notice = if !same_file(&opened, &current) {
                warn!(name = %self.name, offset = cursor.pos(), "File replaced, restarting");
                Some(format!(
                    "{} was replaced; restarting from the beginning",
                    self.name
                ))
            } else if cursor.is_truncated_by(len) {
                warn!(name = %self.name, offset = cursor.pos(), len, "File truncated, restarting");
                Some(format!(
                    "{} was truncated from {} to {} bytes; restarting from the beginning",
                    self.name,
                    cursor.pos(),
                    len
                ))
            } else {
                None
            };
            if let Some(notice) = notice {
                if self
                    .tx
                    .send(StreamEvent::warning(notice, self.redacted))
                    .await
                    .is_err()
                {
                    break;
                }
                file = match File::open(&path).await {
                    Ok(file) => file,
                    Err(e) => {
                        self.fail(format!("Failed to reopen {}: {}", self.name, e)).await;
                        return;
                    }
                };
                cursor.reset();
                lines.clear();
                partial_idle = false;
                continue;
            }

            tokio::select! {
                () = self.tx.closed() => break,
                () = tokio::time::sleep(poll_interval) => {}
            }
        }

        debug!(name = %self.name, "Consumer closed, follow stopped");
    }
}

/// Whether `opened` and `current` describe the same file
///
/// A write-then-rename replacement keeps the path but changes the inode.
#[cfg(unix)]
fn same_file(opened: &std::fs::Metadata, current: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    opened.dev() == current.dev() && opened.ino() == current.ino()
}

/// Without inode identity only truncation is detected
#[cfg(not(unix))]
fn same_file(_opened: &std::fs::Metadata, _current: &std::fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::FrameFormat;
    use crate::event::Level;
    use logvault_core::{LogName, Variant};
    use std::io::Write;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn original(name: &str) -> StoredName {
        StoredName::new(LogName::parse(name).unwrap(), Variant::Original)
    }

    fn fast() -> TailController {
        TailController::new(TailConfig {
            poll_interval: Duration::from_millis(10),
            buffer: 4,
        })
    }

    fn snapshot_of(data: &'static [u8]) -> TailSource {
        TailSource::Snapshot(Box::pin(std::io::Cursor::new(data)))
    }

    async fn next(handle: &mut TailHandle) -> StreamEvent {
        timeout(WAIT, handle.recv()).await.unwrap().unwrap()
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("disk went away")))
        }
    }

    #[tokio::test]
    async fn test_snapshot_skips_blank_lines_in_order() {
        let handle = TailController::default().open(
            &original("app.log"),
            snapshot_of(b"first line\n   \nsecond line"),
        );
        assert_eq!(handle.mode(), TailMode::Snapshot);

        let frames: Vec<Bytes> = handle
            .frames(FrameEncoder::new(FrameFormat::Full))
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<CoreResult<_>>()
            .unwrap();

        assert_eq!(frames.len(), 2);
        let messages: Vec<String> = frames
            .iter()
            .map(|frame| {
                let text = std::str::from_utf8(frame).unwrap();
                let json = text.strip_prefix("data: ").unwrap().strip_suffix("\n\n").unwrap();
                let value: serde_json::Value = serde_json::from_str(json).unwrap();
                for field in ["timestamp", "level", "message", "redacted"] {
                    assert!(value.get(field).is_some(), "missing {field}");
                }
                value["message"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(messages, vec!["first line", "second line"]);
    }

    #[tokio::test]
    async fn test_redacted_flag_follows_name() {
        let name = StoredName::parse("app.log.sanitized").unwrap();
        let mut handle = fast().open(&name, snapshot_of(b"x\n"));
        assert!(next(&mut handle).await.redacted);

        let mut handle = fast().open(&original("app.log"), snapshot_of(b"x\n"));
        assert!(!next(&mut handle).await.redacted);
    }

    #[tokio::test]
    async fn test_snapshot_read_error_ends_with_error_event() {
        let reader = std::io::Cursor::new(&b"ok line\n"[..]).chain(FailingReader);
        let mut handle = fast().open(&original("app.log"), TailSource::Snapshot(Box::pin(reader)));

        assert_eq!(next(&mut handle).await.message, "ok line");
        let last = next(&mut handle).await;
        assert!(last.is_error());
        assert!(last.message.contains("disk went away"));
        assert!(timeout(WAIT, handle.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_follow_emits_appended_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "2024-01-01 INFO start\n").unwrap();

        let mut handle = fast().open(&original("app.log"), TailSource::Follow(path.clone()));
        assert_eq!(handle.mode(), TailMode::Follow);
        assert_eq!(next(&mut handle).await.message, "2024-01-01 INFO start");

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "2024-01-01 ERROR later").unwrap();
        file.flush().unwrap();

        let event = next(&mut handle).await;
        assert_eq!(event.message, "2024-01-01 ERROR later");
        assert_eq!(event.level, Level::Error);
    }

    #[tokio::test]
    async fn test_follow_flushes_idle_partial_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "no newline yet").unwrap();

        let mut handle = fast().open(&original("app.log"), TailSource::Follow(path));
        assert_eq!(next(&mut handle).await.message, "no newline yet");
    }

    #[tokio::test]
    async fn test_follow_stops_when_consumer_drops() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "a\n").unwrap();

        let mut handle = fast().open(&original("app.log"), TailSource::Follow(path));
        next(&mut handle).await;

        let task = handle.cancel();
        timeout(WAIT, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_follow_restarts_after_truncation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "aaaa\nbbbb\n").unwrap();

        let mut handle = fast().open(&original("app.log"), TailSource::Follow(path.clone()));
        assert_eq!(next(&mut handle).await.message, "aaaa");
        assert_eq!(next(&mut handle).await.message, "bbbb");

        std::fs::write(&path, "c\n").unwrap();

        let notice = next(&mut handle).await;
        assert_eq!(notice.level, Level::Warn);
        assert!(notice.message.contains("truncated"));
        assert_eq!(next(&mut handle).await.message, "c");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_follow_restarts_after_rename_over() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "one\n").unwrap();

        let mut handle = fast().open(&original("app.log"), TailSource::Follow(path.clone()));
        assert_eq!(next(&mut handle).await.message, "one");

        // Larger replacement, so the length alone shows no truncation
        let staged = dir.path().join(".app.log.tmp");
        std::fs::write(&staged, "one\ntwo\nthree\n").unwrap();
        std::fs::rename(&staged, &path).unwrap();

        let notice = next(&mut handle).await;
        assert_eq!(notice.level, Level::Warn);
        assert!(notice.message.contains("replaced"));
        assert_eq!(next(&mut handle).await.message, "one");
        assert_eq!(next(&mut handle).await.message, "two");
        assert_eq!(next(&mut handle).await.message, "three");

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "four").unwrap();
        file.flush().unwrap();
        assert_eq!(next(&mut handle).await.message, "four");
    }

    #[tokio::test]
    async fn test_follow_missing_file_ends_with_error_event() {
        let dir = TempDir::new().unwrap();
        let mut handle = fast().open(
            &original("gone.log"),
            TailSource::Follow(dir.path().join("gone.log")),
        );

        assert!(next(&mut handle).await.is_error());
        assert!(timeout(WAIT, handle.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_follow_file_removed_ends_with_error_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "a\n").unwrap();

        let mut handle = fast().open(&original("app.log"), TailSource::Follow(path.clone()));
        next(&mut handle).await;
        std::fs::remove_file(&path).unwrap();

        let last = next(&mut handle).await;
        assert!(last.is_error());
        assert!(timeout(WAIT, handle.recv()).await.unwrap().is_none());
    }
}
