//! Platform API access: throttling, client, NDJSON decoding, wire models.

pub mod client;
pub mod error;
pub mod ndjson;
pub mod throttle;
pub mod types;

pub use client::{validate_username, ApiClient};
pub use error::ApiError;
pub use throttle::{Endpoint, Throttle};
