//! Core error types for logvault.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Validation error
    Validation {
        /// Field or input that failed validation
        field: String,
        /// Why it failed
        reason: String,
    },

    /// Not found
    NotFound {
        /// Kind of thing that was looked up
        kind: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Already exists
    AlreadyExists {
        /// Kind of thing that exists
        kind: String,
        /// Identifier that exists
        id: String,
    },

    /// Storage backend failure (unreachable, read or write failed)
    Storage {
        /// Operation that failed
        operation: String,
        /// Backend-provided reason
        reason: String,
    },

    /// Internal error (for unexpected errors)
    Internal {
        /// Error message
        message: String,
    },
}

impl CoreError {
    /// Shorthand for a validation error
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a not-found error
    #[must_use]
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Shorthand for a storage error
    #[must_use]
    pub fn storage(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller is at fault (bad input or missing resource)
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound { .. } | Self::AlreadyExists { .. }
        )
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, reason } => {
                write!(f, "Validation failed for {}: {}", field, reason)
            }
            Self::NotFound { kind, id } => write!(f, "{} not found: {}", kind, id),
            Self::AlreadyExists { kind, id } => write!(f, "{} already exists: {}", kind, id),
            Self::Storage { operation, reason } => {
                write!(f, "Storage error during {}: {}", operation, reason)
            }
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON encoding failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::NotFound {
            kind: "Log".to_string(),
            id: "app.log".to_string(),
        };
        assert_eq!(format!("{}", err), "Log not found: app.log");

        let err = CoreError::validation("filename", "extension not allowed");
        assert_eq!(
            format!("{}", err),
            "Validation failed for filename: extension not allowed"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let err = CoreError::storage("put", "disk full");
        let s = format!("{}", err);
        assert!(s.contains("put"));
        assert!(s.contains("disk full"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CoreError::validation("file", "missing").is_client_error());
        assert!(CoreError::not_found("Log", "x.log").is_client_error());
        assert!(!CoreError::storage("get", "io").is_client_error());
        assert!(
            !CoreError::Internal {
                message: "boom".to_string()
            }
            .is_client_error()
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = CoreError::not_found("Log", "a.log");
        let err2 = CoreError::not_found("Log", "a.log");
        assert_eq!(err1, err2);

        let err3 = CoreError::not_found("Log", "b.log");
        assert_ne!(err1, err3);
    }
}
