//! Shared-secret check for write routes.

use crate::api::AppState;
use crate::error::ApiError;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use secrecy::ExposeSecret;
use tracing::warn;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject the request unless it carries the configured key
///
/// With no key configured every request passes.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` on a missing or different key
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.config.api_key.as_ref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .map(|value| value.as_bytes());
        let valid = provided.is_some_and(|p| keys_match(p, expected.expose_secret().as_bytes()));
        if !valid {
            warn!(
                operation = "auth",
                method = %request.method(),
                path = %request.uri().path(),
                present = provided.is_some(),
                "Rejected write without valid API key"
            );
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

/// Compare without stopping at the first differing byte
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match() {
        assert!(keys_match(b"secret", b"secret"));
        assert!(!keys_match(b"secreT", b"secret"));
        assert!(!keys_match(b"secret1", b"secret"));
        assert!(!keys_match(b"", b"secret"));
    }
}
