//! HTTP error mapping.

use crate::ingest::IngestError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use logvault_core::CoreError;
use logvault_storage::StorageError;
use serde_json::json;

/// Error returned by a handler
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad input from the client
    #[error("{0}")]
    Validation(String),

    /// Requested log does not exist
    #[error("{0}")]
    NotFound(String),

    /// Missing or wrong API key
    #[error("Missing or invalid API key")]
    Unauthorized,

    /// Target already exists
    #[error("{0}")]
    Conflict(String),

    /// Upload body over the configured limit
    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// Backend failure
    #[error("{0}")]
    Storage(String),

    /// Ingestion failed part way
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Unexpected failure
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Ingest(IngestError::Invalid(_)) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Ingest(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short machine-readable kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Ingest(IngestError::Invalid(_)) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Storage(_) | Self::Ingest(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { .. } => Self::Validation(err.to_string()),
            CoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            CoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            CoreError::Storage { .. } => Self::Storage(err.to_string()),
            CoreError::Internal { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        CoreError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let Self::Ingest(ingest) = &self {
            if let Some(stage) = ingest.stage() {
                body["stage"] = json!(stage);
                body["filename"] = json!(ingest.filename());
            }
        }
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (CoreError::validation("file", "bad"), StatusCode::BAD_REQUEST),
            (CoreError::not_found("Log", "a.log"), StatusCode::NOT_FOUND),
            (
                CoreError::AlreadyExists {
                    kind: "Log".to_string(),
                    id: "a.log".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (CoreError::storage("put", "disk full"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_storage_not_found_is_404() {
        let err = ApiError::from(StorageError::NotFound {
            container: "logs-original".to_string(),
            name: "a.log".to_string(),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_fixed_statuses() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::PayloadTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_sanitized_stage_in_body() {
        let err = ApiError::from(IngestError::SanitizedWrite {
            filename: "a.log".to_string(),
            source: StorageError::Unavailable("down".to_string()),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["stage"], "sanitized");
        assert_eq!(json["filename"], "a.log");
        assert_eq!(json["error"], "storage");
    }
}
