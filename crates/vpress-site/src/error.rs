//! Site error types.

use thiserror::Error;

/// Result type for site operations.
pub type SiteResult<T> = Result<T, SiteError>;

/// Errors that can occur talking to the CMS.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

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

impl SiteError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map an HTTP status to an error.
    pub fn from_http_status(status: u16, message: String, retry_after_ms: Option<u64>) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(message),
            429 => Self::RateLimited(retry_after_ms.unwrap_or(0)),
            500..=599 => Self::ServerError(status, message),
            _ => Self::RequestFailed(message),
        }
    }

    /// Check if the error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SiteError::Network(_) | SiteError::RateLimited(_) | SiteError::ServerError(_, _)
        )
    }

    /// Server-requested minimum delay before the next attempt.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            SiteError::RateLimited(ms) if *ms > 0 => Some(*ms),
            _ => None,
        }
    }
}
