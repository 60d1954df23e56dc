use thiserror::Error;

use crate::api::ApiError;

/// Centralized error type for the application
///
/// Layer errors (`ApiError`, parse errors, IO) are converted into this enum
/// for consistent handling at the top level. Uses `thiserror` for automatic
/// conversions and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Platform API errors (transport, status, decode, rate limiting)
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// HTTP transport errors outside the API client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL building errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anyhow errors (binary edge)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Input validation errors (bad usernames, out-of-range params)
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Validation(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Validation(err.to_string())
    }
}
