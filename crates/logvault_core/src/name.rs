//! Log file identity.
//!
//! A stored log is identified by a client-supplied file name. Names are
//! validated once on the way in; after that a [`LogName`] is known to be a
//! single path component with an allow-listed extension.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extensions accepted on upload (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: [&str; 2] = [".log", ".txt"];

/// Suffix appended to an original name to form its sanitized name
pub const SANITIZED_SUFFIX: &str = ".sanitized";

/// Longest accepted name, in bytes, before the sanitized suffix
const MAX_NAME_LEN: usize = 255 - SANITIZED_SUFFIX.len();

/// Which copy of a log a stored file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Bytes exactly as uploaded
    Original,
    /// Output of the redaction engine, written once at ingestion
    Sanitized,
}

impl Variant {
    /// Both variants, originals first
    pub const ALL: [Variant; 2] = [Variant::Original, Variant::Sanitized];

    /// Container holding this variant in a storage backend
    #[must_use]
    pub const fn container(self) -> &'static str {
        match self {
            Self::Original => "logs-original",
            Self::Sanitized => "logs-sanitized",
        }
    }

    /// Lowercase label used in listings
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Sanitized => "sanitized",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated original log name such as `app.log`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LogName(String);

impl LogName {
    /// Validate a client-supplied file name
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the name is empty, too long, not a
    /// single path component, hidden, contains control characters, or does
    /// not end in an allowed extension.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| Err(CoreError::validation("filename", reason));

        if raw.is_empty() {
            return invalid("filename is empty");
        }
        if raw.len() > MAX_NAME_LEN {
            return invalid("filename is too long");
        }
        if raw.contains(['/', '\\']) {
            return invalid("filename must not contain path separators");
        }
        if raw.starts_with('.') {
            return invalid("filename must not start with '.'");
        }
        if raw.chars().any(char::is_control) {
            return invalid("filename must not contain control characters");
        }
        if !has_allowed_extension(raw) {
            return Err(CoreError::validation(
                "filename",
                format!(
                    "extension not allowed, expected one of {}",
                    ALLOWED_EXTENSIONS.join(", ")
                ),
            ));
        }

        Ok(Self(raw.to_string()))
    }

    /// The name as uploaded
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the sanitized copy, `<name>.sanitized`
    #[must_use]
    pub fn sanitized(&self) -> String {
        format!("{}{}", self.0, SANITIZED_SUFFIX)
    }
}

impl fmt::Display for LogName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LogName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Case-insensitive suffix check against [`ALLOWED_EXTENSIONS`]
#[must_use]
pub fn has_allowed_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .any(|ext| lower.len() > ext.len() && lower.ends_with(ext))
}

/// A name as it appears in storage: an original or its sanitized copy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredName {
    base: LogName,
    variant: Variant,
}

impl StoredName {
    /// Create from a base name and variant
    #[must_use]
    pub const fn new(base: LogName, variant: Variant) -> Self {
        Self { base, variant }
    }

    /// Parse a requested name; a `.sanitized` suffix selects the sanitized variant
    ///
    /// The variant is decided by the suffix alone, never by file content.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the base name is not a valid [`LogName`]
    pub fn parse(raw: &str) -> CoreResult<Self> {
        match raw.strip_suffix(SANITIZED_SUFFIX) {
            Some(base) => Ok(Self::new(LogName::parse(base)?, Variant::Sanitized)),
            None => Ok(Self::new(LogName::parse(raw)?, Variant::Original)),
        }
    }

    /// The original name this file derives from
    #[must_use]
    pub const fn base(&self) -> &LogName {
        &self.base
    }

    /// Which copy this is
    #[must_use]
    pub const fn variant(&self) -> Variant {
        self.variant
    }

    /// Whether this names the sanitized copy
    #[must_use]
    pub fn is_sanitized(&self) -> bool {
        self.variant == Variant::Sanitized
    }

    /// Container this file lives in
    #[must_use]
    pub const fn container(&self) -> &'static str {
        self.variant.container()
    }

    /// File name within its container
    #[must_use]
    pub fn file_name(&self) -> String {
        match self.variant {
            Variant::Original => self.base.as_str().to_string(),
            Variant::Sanitized => self.base.sanitized(),
        }
    }
}

impl fmt::Display for StoredName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
