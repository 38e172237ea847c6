//! Stream event types.
//!
//! Events are ephemeral: built when a line is emitted, handed to the
//! transport, never stored. They carry no time of their own; the encoder
//! stamps each frame when it is written.

use serde::{Deserialize, Serialize};

/// Severity level of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Debug or trace output
    Debug,
    /// Informational (default)
    Info,
    /// Warning
    Warn,
    /// Error, including stream failures
    Error,
}

impl Level {
    /// Guess the level of a log line from upper-case severity words
    ///
    /// Matches whole tokens only, so `ERRORS` or `error` stay `Info`.
    #[must_use]
    pub fn infer(line: &str) -> Self {
        let mut level = Self::Info;
        for token in line.split(|c: char| !c.is_ascii_alphanumeric()) {
            let found = match token {
                "ERROR" | "FATAL" | "CRITICAL" => Self::Error,
                "WARN" | "WARNING" => Self::Warn,
                "DEBUG" | "TRACE" => Self::Debug,
                _ => continue,
            };
            if found == Self::Error {
                return found;
            }
            if level == Self::Info || found > level {
                level = found;
            }
        }
        level
    }

    /// Lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// One emitted unit of a log stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamEvent {
    /// Severity level
    pub level: Level,
    /// Line text, or a description of a failure
    pub message: String,
    /// Whether the stream reads a sanitized copy
    pub redacted: bool,
}

impl StreamEvent {
    /// Event for a log line
    #[must_use]
    pub fn line(message: impl Into<String>, redacted: bool) -> Self {
        let message = message.into();
        Self {
            level: Level::infer(&message),
            message,
            redacted,
        }
    }

    /// Terminal event describing a read failure
    #[must_use]
    pub fn error(message: impl Into<String>, redacted: bool) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            redacted,
        }
    }

    /// Out-of-band notice, e.g. a truncated file
    #[must_use]
    pub fn warning(message: impl Into<String>, redacted: bool) -> Self {
        Self {
            level: Level::Warn,
            message: message.into(),
            redacted,
        }
    }

    /// Check if this is an error event
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}
