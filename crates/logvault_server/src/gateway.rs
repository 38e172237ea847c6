//! Upload gateway: multipart decoding and filename checks.

use crate::error::ApiError;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use logvault_core::{CoreError, LogName};

/// Form field carrying the upload
pub const UPLOAD_FIELD: &str = "file";

/// A decoded upload
#[derive(Debug, Clone)]
pub struct Upload {
    /// Validated client file name
    pub name: LogName,
    /// Raw content
    pub bytes: Bytes,
}

/// Pull the `file` part out of a multipart body
///
/// Other parts are skipped. The name is validated before the content is read.
///
/// # Errors
///
/// Returns `ApiError::Validation` for a missing part, an empty file name or
/// a disallowed name, and `ApiError::PayloadTooLarge` when the body limit
/// is hit
pub async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().trim().to_string();
        if filename.is_empty() {
            return Err(CoreError::validation(UPLOAD_FIELD, "No file selected").into());
        }
        let name = LogName::parse(&filename)?;
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        return Ok(Upload { name, bytes });
    }

    Err(CoreError::validation(UPLOAD_FIELD, "No file part in request").into())
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::Validation(format!("Malformed upload: {}", err.body_text()))
    }
}
