//! Error types for generation service calls.

use std::time::Duration;

/// Message the Google APIs attach to a 404 when the key's project is unknown or unbilled.
pub(crate) const ENTITY_NOT_FOUND_MESSAGE: &str = "Requested entity was not found";

/// Errors returned by the generation service adapter.
#[derive(Debug, thiserror::Error)]
pub enum GenStudioError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service did not recognize the credential's project or model.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// Synthesized audio could not be packaged.
    #[error("audio encoding failed: {0}")]
    Audio(#[from] hound::Error),

    /// The service answered with a shape we could not use.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl GenStudioError {
    /// Returns true when the service reported "Requested entity was not found".
    ///
    /// The hosted API uses this for keys without an enabled, billed project,
    /// so callers treat it as a credential problem rather than a generic failure.
    pub fn is_entity_not_found(&self) -> bool {
        match self {
            Self::EntityNotFound(_) => true,
            Self::Api { message, .. } | Self::Auth(message) | Self::InvalidRequest(message) => {
                message.contains(ENTITY_NOT_FOUND_MESSAGE)
            }
            _ => false,
        }
    }
}

/// Result type alias for generation service operations.
pub type Result<T> = std::result::Result<T, GenStudioError>;

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Extracts the human-readable message from a Google API error body and caps its length.
///
/// Error bodies look like `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`.
/// Anything else is passed through trimmed.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string());

    if message.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        message
    }
}

/// Parses a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_not_found_detection() {
        assert!(GenStudioError::EntityNotFound("x".into()).is_entity_not_found());
        assert!(!GenStudioError::Api {
            status: 404,
            message: "models/imagen-typo is not found for API version v1beta".into()
        }
        .is_entity_not_found());
        assert!(GenStudioError::Api {
            status: 400,
            message: "Requested entity was not found.".into()
        }
        .is_entity_not_found());

        assert!(!GenStudioError::Api {
            status: 500,
            message: "Internal".into()
        }
        .is_entity_not_found());
        assert!(!GenStudioError::Auth("Invalid API key".into()).is_entity_not_found());
    }

    #[test]
    fn test_sanitize_extracts_google_error_message() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(
            sanitize_error_message(body),
            "Requested entity was not found."
        );
        assert_eq!(sanitize_error_message("  plain text \n"), "plain text");
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(2_000);
        let sanitized = sanitize_error_message(&body);
        assert_eq!(sanitized.len(), MAX_ERROR_MESSAGE_LEN + 3);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(reqwest::header::RETRY_AFTER, "42".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(42));
    }

    #[test]
    fn test_error_display() {
        let err = GenStudioError::Api {
            status: 500,
            message: "Backend error".into(),
        };
        assert_eq!(err.to_string(), "API error: 500 - Backend error");
    }
}
