//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur talking to the video store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited, retry after {0}ms")]
    RateLimited(u64),

    #[error("Server error [{0}]: {1}")]
    ServerError(u16, String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP status to an error. `retry_after_ms` comes from the
    /// Retry-After header when the server sent one.
    pub fn from_http_status(status: u16, message: String, retry_after_ms: Option<u64>) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(retry_after_ms.unwrap_or(0)),
            500..=599 => Self::ServerError(status, message),
            _ => Self::RequestFailed(message),
        }
    }

    /// Check if the error is worth retrying.
    ///
    /// Retryable: network errors, 429, 5xx. Not retryable: other 4xx,
    /// auth and config errors, malformed responses.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Network(_) | StoreError::RateLimited(_) | StoreError::ServerError(_, _)
        )
    }

    /// Server-requested minimum delay before the next attempt.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            StoreError::RateLimited(ms) if *ms > 0 => Some(*ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            StoreError::from_http_status(401, "x".into(), None),
            StoreError::Unauthorized(_)
        ));
        assert!(matches!(
            StoreError::from_http_status(404, "x".into(), None),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from_http_status(429, "x".into(), Some(1500)),
            StoreError::RateLimited(1500)
        ));
        assert!(matches!(
            StoreError::from_http_status(503, "x".into(), None),
            StoreError::ServerError(503, _)
        ));
        assert!(matches!(
            StoreError::from_http_status(400, "x".into(), None),
            StoreError::RequestFailed(_)
        ));
    }

    #[test]
    fn retryability() {
        assert!(StoreError::from_http_status(429, "x".into(), None).is_retryable());
        assert!(StoreError::from_http_status(500, "x".into(), None).is_retryable());
        assert!(!StoreError::from_http_status(400, "x".into(), None).is_retryable());
        assert!(!StoreError::from_http_status(403, "x".into(), None).is_retryable());
        assert!(!StoreError::config("missing key").is_retryable());
    }

    #[test]
    fn retry_after_only_when_present() {
        assert_eq!(
            StoreError::from_http_status(429, "x".into(), Some(2000)).retry_after_ms(),
            Some(2000)
        );
        assert_eq!(
            StoreError::from_http_status(429, "x".into(), None).retry_after_ms(),
            None
        );
    }
}
