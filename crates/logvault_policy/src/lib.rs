//! Logvault Redaction Policy
//!
//! Decides which log lines are sensitive and rewrites them deterministically.
//! Pure text in, text out: no I/O, no clock, no randomness.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod matcher;
pub mod redact;

pub use matcher::{KeywordMatcher, MatchResult, SENSITIVE_KEYWORDS};
pub use redact::{
    sanitize, RedactionDecision, Redactor, SanitizeReport, PREFIX_CHARS, REDACTION_MARKER,
};
