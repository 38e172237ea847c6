//! Read position in a followed file.

/// Byte offset of the next unread byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    position: u64,
}

impl Cursor {
    /// Cursor at the start of a file
    #[must_use]
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    /// Cursor at a given offset
    #[must_use]
    pub const fn at(position: u64) -> Self {
        Self { position }
    }

    /// Record that `count` more bytes were read
    pub fn advance(&mut self, count: u64) {
        self.position = self.position.saturating_add(count);
    }

    /// Whether a file of `len` bytes is shorter than what was already read
    #[must_use]
    pub const fn is_truncated_by(&self, len: u64) -> bool {
        len < self.position
    }

    /// Current offset
    #[must_use]
    pub const fn pos(&self) -> u64 {
        self.position
    }

    /// Back to the start
    pub fn reset(&mut self) {
        self.position = 0;
    }
}
