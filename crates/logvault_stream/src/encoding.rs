//! Frame encoding for the `text/event-stream` transport.
//!
//! Every event becomes exactly one frame: `data: <json>\n\n`. JSON never
//! contains a raw newline, so a frame cannot be split by its payload.

use crate::event::{Level, StreamEvent};
use bytes::Bytes;
use logvault_core::{CoreError, CoreResult, Timestamp};
use serde::{Deserialize, Serialize};

/// Content type of an encoded frame stream
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// JSON shape of a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// `{timestamp, level, message, redacted}`
    #[default]
    Full,
    /// `{timestamp, message}` for older clients
    Simple,
}

impl std::str::FromStr for FrameFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "simple" => Ok(Self::Simple),
            other => Err(CoreError::validation(
                "frame_format",
                format!("unknown frame format '{other}', expected 'full' or 'simple'"),
            )),
        }
    }
}

#[derive(Serialize)]
struct SimpleFrame<'a> {
    timestamp: Timestamp,
    message: &'a str,
}

#[derive(Serialize)]
struct FullFrame<'a> {
    timestamp: Timestamp,
    level: Level,
    message: &'a str,
    redacted: bool,
}

/// Encodes events as frames
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder {
    format: FrameFormat,
}

impl FrameEncoder {
    /// Create an encoder for the given frame shape
    #[must_use]
    pub const fn new(format: FrameFormat) -> Self {
        Self { format }
    }

    /// Frame shape produced
    #[must_use]
    pub const fn format(&self) -> FrameFormat {
        self.format
    }

    /// Encode one event as `data: <json>\n\n`, stamped with the current time
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails
    pub fn encode(&self, event: &StreamEvent) -> CoreResult<Bytes> {
        self.encode_at(event, Timestamp::now())
    }

    /// Encode one event with an explicit frame timestamp
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails
    pub fn encode_at(&self, event: &StreamEvent, timestamp: Timestamp) -> CoreResult<Bytes> {
        let json = match self.format {
            FrameFormat::Full => serde_json::to_vec(&FullFrame {
                timestamp,
                level: event.level,
                message: &event.message,
                redacted: event.redacted,
            })?,
            FrameFormat::Simple => serde_json::to_vec(&SimpleFrame {
                timestamp,
                message: &event.message,
            })?,
        };

        let mut frame = Vec::with_capacity(json.len() + 8);
        frame.extend_from_slice(b"data: ");
        frame.extend_from_slice(&json);
        frame.extend_from_slice(b"\n\n");
        Ok(Bytes::from(frame))
    }
}
