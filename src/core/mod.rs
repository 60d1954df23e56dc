//! Core utilities, configuration, and common functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod retry;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_api_configuration};
