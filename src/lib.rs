//! Arbiter: moderation engine for an online chess platform.
//!
//! Aggregates per-user statistics (alt-account fingerprints,
//! boosting/sandbagging signals) and moderates tournament chat by polling
//! the platform's REST/NDJSON API under strict rate limits. Output is
//! alerts and HTML fragments for the moderator dashboard; the only
//! automatic action is a cooldown-gated chat timeout.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, metrics, retry
//! - `api`: throttled API client, NDJSON decoding, wire models
//! - `storage`: in-process TTL response caches
//! - `chat`: rule banks, scoring cascade, gibberish detector, timeouts
//! - `tournament`: the chat polling loop
//! - `detect`: alt and boost aggregators
//! - `render`: HTML fragment helpers

pub mod api;
pub mod chat;
pub mod core;
pub mod detect;
pub mod render;
pub mod storage;
pub mod tournament;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use api::{ApiClient, ApiError, Throttle};
pub use chat::{classify, Classified, TimeoutGate};
pub use tournament::{start_poller, ChatAlert};
