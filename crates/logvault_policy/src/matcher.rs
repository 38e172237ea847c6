//! Sensitive keyword matching.
//!
//! Matching is a plain case-insensitive containment check. It is not a
//! tokenizer: `keyboard` matches `key`, and a keyword in a field value
//! matches just like one in a field name.

use serde::{Deserialize, Serialize};

/// Keywords that mark a line as sensitive
pub const SENSITIVE_KEYWORDS: [&str; 4] = ["password", "token", "key", "secret"];

/// Match result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether any keyword matched
    pub matched: bool,
    /// First keyword (in matcher order) found in the line
    pub keyword: Option<String>,
}

impl MatchResult {
    /// A non-match
    #[must_use]
    pub fn none() -> Self {
        Self {
            matched: false,
            keyword: None,
        }
    }

    /// A match on `keyword`
    #[must_use]
    pub fn on(keyword: &str) -> Self {
        Self {
            matched: true,
            keyword: Some(keyword.to_string()),
        }
    }

    /// Check if matched
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.matched
    }
}

/// Case-insensitive substring matcher over a keyword set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatcher {
    /// Lowercased keywords, in priority order
    keywords: Vec<String>,
}

impl KeywordMatcher {
    /// Matcher over the built-in [`SENSITIVE_KEYWORDS`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_keywords(SENSITIVE_KEYWORDS)
    }

    /// Matcher over a custom keyword set; empty keywords are ignored
    #[must_use]
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// The keywords this matcher checks, lowercased
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Match a single line
    #[must_use]
    pub fn match_line(&self, line: &str) -> MatchResult {
        let lowered = line.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map_or_else(MatchResult::none, |k| MatchResult::on(k))
    }

    /// Whether a line contains any keyword
    #[must_use]
    pub fn is_sensitive(&self, line: &str) -> bool {
        self.match_line(line).matched
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new()
    }
}
