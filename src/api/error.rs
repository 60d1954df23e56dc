use std::time::Duration;
use thiserror::Error;

use crate::core::retry::Retryable;

/// Errors from the platform API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, connect, body read)
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status other than 404/429
    #[error("HTTP request failed with status: {0}")]
    Status(reqwest::StatusCode),

    /// HTTP 404: unknown user, closed account, missing tournament
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 429: the server told us to back off
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Duration },

    /// Response body did not decode
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request could not be built (bad base URL)
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Caller-supplied input rejected before hitting the wire
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status(status) => status.is_server_error(),
            ApiError::RateLimited { .. } => true,
            ApiError::NotFound(_) | ApiError::Decode(_) | ApiError::Url(_) | ApiError::BadRequest(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
