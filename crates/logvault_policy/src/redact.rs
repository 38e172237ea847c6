//! Line redaction for sensitive log content.
//!
//! A sensitive line is replaced by its first [`PREFIX_CHARS`] characters, the
//! [`REDACTION_MARKER`], and the SHA-256 of the whole original line:
//!
//! ```text
//! 2024-01-01 password=abc123
//! 2024-01-01 password=abc1 [REDACTED] 6c1f...e2
//! ```
//!
//! The prefix is meant to keep a leading timestamp readable. A sensitive line
//! shorter than the prefix is kept whole before the marker, so its text is
//! not hidden at all. That behaviour is kept for compatibility with existing
//! sanitized files.

use crate::matcher::KeywordMatcher;
use logvault_core::Digest;
use serde::{Deserialize, Serialize};

/// Characters of the original line kept in front of the marker
pub const PREFIX_CHARS: usize = 24;

/// Marker placed between the kept prefix and the line digest
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Per-line decision, computed during sanitization and then discarded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionDecision {
    /// Whether the line is sensitive
    pub sensitive: bool,
    /// Replacement text when sensitive
    pub replacement: Option<String>,
}

impl RedactionDecision {
    /// Decision for a line that passes through unchanged
    #[must_use]
    pub fn keep() -> Self {
        Self {
            sensitive: false,
            replacement: None,
        }
    }

    /// Decision for a line that is replaced
    #[must_use]
    pub fn replace(replacement: String) -> Self {
        Self {
            sensitive: true,
            replacement: Some(replacement),
        }
    }

    /// The text to emit for `line` under this decision
    #[must_use]
    pub fn apply<'a>(&'a self, line: &'a str) -> &'a str {
        self.replacement.as_deref().unwrap_or(line)
    }
}

/// Result of sanitizing a whole document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeReport {
    /// Sanitized text
    pub text: String,
    /// Number of lines seen, including empty ones
    pub lines_total: usize,
    /// Number of lines replaced
    pub lines_redacted: usize,
}

impl SanitizeReport {
    /// Check if any redactions were applied
    #[must_use]
    pub fn is_redacted(&self) -> bool {
        self.lines_redacted > 0
    }
}

/// Redactor for applying the line policy
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    matcher: KeywordMatcher,
}

impl Redactor {
    /// Redactor using the built-in sensitive keywords
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redactor using a custom matcher
    #[must_use]
    pub fn with_matcher(matcher: KeywordMatcher) -> Self {
        Self { matcher }
    }

    /// Decide what to do with one line (no trailing newline)
    #[must_use]
    pub fn decide(&self, line: &str) -> RedactionDecision {
        if !self.matcher.is_sensitive(line) {
            return RedactionDecision::keep();
        }

        RedactionDecision::replace(redact_line(line))
    }

    /// Sanitize a whole document and count what was replaced
    ///
    /// Lines are split on `\n` and rejoined with `\n`; empty lines and a
    /// trailing empty element survive, so line count and order are unchanged.
    #[must_use]
    pub fn sanitize_report(&self, content: &str) -> SanitizeReport {
        let mut lines_total = 0;
        let mut lines_redacted = 0;
        let mut out = Vec::new();

        for line in content.split('\n') {
            lines_total += 1;
            let decision = self.decide(line);
            if decision.sensitive {
                lines_redacted += 1;
            }
            out.push(decision.apply(line).to_string());
        }

        SanitizeReport {
            text: out.join("\n"),
            lines_total,
            lines_redacted,
        }
    }

    /// Sanitize a whole document
    #[must_use]
    pub fn sanitize(&self, content: &str) -> String {
        self.sanitize_report(content).text
    }
}

/// Sanitize with the built-in keyword set
#[must_use]
pub fn sanitize(content: &str) -> String {
    Redactor::new().sanitize(content)
}

/// `<prefix> [REDACTED] <sha256 of line>`
fn redact_line(line: &str) -> String {
    let prefix = match line.char_indices().nth(PREFIX_CHARS) {
        Some((idx, _)) => &line[..idx],
        None => line,
    };
    let digest = Digest::compute(line.as_bytes());
    format!("{} {} {}", prefix, REDACTION_MARKER, digest.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sha(line: &str) -> String {
        Digest::compute(line.as_bytes()).to_hex()
    }

    #[test]
    fn test_passes_clean_lines_through() {
        let input = "2024-01-01 INFO started\n2024-01-01 INFO ready";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn test_long_password_line_keeps_24_char_prefix() {
        let line = "2024-01-01 password=abc123";
        let out = sanitize(line);
        assert_eq!(out, format!("2024-01-01 password=abc1 [REDACTED] {}", sha(line)));
    }

    #[test]
    fn test_exactly_24_chars_is_kept_whole() {
        let line = "token=123456789012345678";
        assert_eq!(line.chars().count(), 24);
        assert_eq!(sanitize(line), format!("{} [REDACTED] {}", line, sha(line)));
    }

    #[test]
    fn test_short_secret_line_leaks_full_text() {
        let line = "secret=hunter2";
        assert!(line.len() < PREFIX_CHARS);
        assert_eq!(sanitize(line), format!("secret=hunter2 [REDACTED] {}", sha(line)));
    }

    #[test]
    fn test_preserves_empty_lines_and_trailing_newline() {
        let input = "a\n\nkey=1\n";
        let out = sanitize(input);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "a");
        assert_eq!(lines[1], "");
        assert!(lines[2].starts_with("key=1 [REDACTED] "));
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_carriage_return_is_part_of_line() {
        let line = "password\r";
        assert_eq!(sanitize(line), format!("password\r [REDACTED] {}", sha(line)));
    }

    #[test]
    fn test_prefix_counts_chars_not_bytes() {
        let line = "ééééééééééééééééééééééééé token";
        let out = sanitize(line);
        let expected_prefix: String = line.chars().take(24).collect();
        assert!(out.starts_with(&format!("{} [REDACTED] ", expected_prefix)));
    }

    #[test]
    fn test_keyboard_is_redacted() {
        let out = sanitize("2024-01-01 INFO keyboard attached");
        assert!(out.contains(REDACTION_MARKER));
    }

    #[test]
    fn test_report_counts() {
        let report = Redactor::new().sanitize_report("ok\npassword=1\n\ntoken=2");
        assert_eq!(report.lines_total, 4);
        assert_eq!(report.lines_redacted, 2);
        assert!(report.is_redacted());

        let clean = Redactor::new().sanitize_report("ok");
        assert!(!clean.is_redacted());
    }

    #[test]
    fn test_decision() {
        let redactor = Redactor::new();
        let keep = redactor.decide("hello");
        assert_eq!(keep, RedactionDecision::keep());
        assert_eq!(keep.apply("hello"), "hello");

        let replace = redactor.decide("my key");
        assert!(replace.sensitive);
        assert_eq!(replace.apply("my key"), format!("my key [REDACTED] {}", sha("my key")));
    }

    #[test]
    fn test_custom_matcher() {
        let redactor = Redactor::with_matcher(KeywordMatcher::with_keywords(["ssn"]));
        assert_eq!(redactor.sanitize("password=1"), "password=1");
        assert!(redactor.sanitize("SSN=1").contains(REDACTION_MARKER));
    }

    proptest! {
        #[test]
        fn prop_line_count_and_order_preserved(lines in proptest::collection::vec("[a-z =]{0,40}", 0..20)) {
            let input = lines.join("\n");
            let out = sanitize(&input);
            let out_lines: Vec<&str> = out.split('\n').collect();
            let in_lines: Vec<&str> = input.split('\n').collect();
            prop_assert_eq!(out_lines.len(), in_lines.len());
            for (i, o) in in_lines.iter().zip(out_lines.iter()) {
                if KeywordMatcher::new().is_sensitive(i) {
                    prop_assert!(o.contains(REDACTION_MARKER));
                } else {
                    prop_assert_eq!(i, o);
                }
            }
        }

        #[test]
        fn prop_idempotent_when_prefix_is_clean(
            stamp in "[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2} ",
            keyword in prop::sample::select(vec!["password", "TOKEN", "Key", "secret"]),
            tail in "[a-z0-9=]{0,20}",
        ) {
            // 20-char stamp + 4 padding chars: the keyword always lands past the prefix.
            let line = format!("{}INFO{}{}", stamp, keyword, tail);
            let once = sanitize(&line);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_idempotent_on_clean_text(text in "[abd-jl-moq-z0-9 \n]{0,200}") {
            // no c, k, n or p: no keyword can be formed
            let once = sanitize(&text);
            prop_assert_eq!(&once, &text);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn prop_password_line_at_least_24_chars(
            head in "[A-Za-z0-9 :-]{0,30}",
            case in prop::sample::select(vec!["password", "PASSWORD", "PassWord"]),
            tail in "[A-Za-z0-9 =]{0,30}",
        ) {
            let line = format!("{}{}{}", head, case, tail);
            prop_assume!(line.chars().count() >= PREFIX_CHARS);
            let prefix: String = line.chars().take(PREFIX_CHARS).collect();
            prop_assert_eq!(sanitize(&line), format!("{} [REDACTED] {}", prefix, sha(&line)));
        }

        #[test]
        fn prop_short_secret_line_kept_whole(
            head in "[a-z ]{0,8}",
            tail in "[a-z0-9=]{0,8}",
        ) {
            let line = format!("{}secret{}", head, tail);
            prop_assert!(line.chars().count() < PREFIX_CHARS);
            prop_assert_eq!(sanitize(&line), format!("{} [REDACTED] {}", line, sha(&line)));
        }
    }
}
