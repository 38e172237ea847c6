//! Logvault Event Streams
//!
//! Turns stored log content into an ordered sequence of timestamped events
//! and encodes each one as a self-delimited `text/event-stream` frame.
//! Content is either read once to the end (snapshot) or followed as it grows.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod encoding;
pub mod event;
pub mod lines;
pub mod tail;

pub use cursor::Cursor;
pub use encoding::{FrameEncoder, FrameFormat, EVENT_STREAM_CONTENT_TYPE};
pub use event::{Level, StreamEvent};
pub use lines::{is_blank, LineBuffer};
pub use tail::{TailConfig, TailController, TailHandle, TailMode, TailSource};
