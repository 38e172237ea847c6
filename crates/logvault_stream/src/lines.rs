//! Incremental line splitting.

/// Whether a line carries no content and should not be emitted
#[must_use]
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Accumulates raw chunks and yields complete lines
///
/// Bytes after the last `\n` are held until more data arrives or the caller
/// takes them with [`LineBuffer::take_partial`]. Invalid UTF-8 is replaced
/// rather than rejected.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Whether an unterminated line is held
    #[must_use]
    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take the unterminated trailing line, if any
    pub fn take_partial(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let pending = std::mem::take(&mut self.pending);
        Some(decode_line(&pending))
    }

    /// Drop any held bytes
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   \t"));
        assert!(!is_blank(" x "));
    }

    #[test]
    fn test_push_complete_lines() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"one\ntwo\n"), vec!["one", "two"]);
        assert!(!buf.has_partial());
    }

    #[test]
    fn test_push_holds_partial_line() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"one\ntw"), vec!["one"]);
        assert!(buf.has_partial());
        assert_eq!(buf.push(b"o\nthr"), vec!["two"]);
        assert_eq!(buf.take_partial().as_deref(), Some("thr"));
        assert!(buf.take_partial().is_none());
    }

    #[test]
    fn test_chunk_without_newline() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"abc").is_empty());
        assert!(buf.push(b"def").is_empty());
        assert_eq!(buf.push(b"\n"), vec!["abcdef"]);
    }

    #[test]
    fn test_crlf_and_empty_lines() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"a\r\n\nb\r\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_split_multibyte_char() {
        let mut buf = LineBuffer::new();
        let text = "héllo\n".as_bytes();
        assert!(buf.push(&text[..2]).is_empty());
        assert_eq!(buf.push(&text[2..]), vec!["héllo"]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"ok \xff\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ok "));
        assert!(lines[0].contains('\u{fffd}'));
    }

    #[test]
    fn test_clear() {
        let mut buf = LineBuffer::new();
        buf.push(b"partial");
        buf.clear();
        assert!(!buf.has_partial());
    }
}
