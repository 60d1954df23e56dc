//! Prometheus metrics for the moderation engine
//!
//! Tracks API traffic (requests, 429s, retries), classifier throughput,
//! alert/timeout volume, and poller state. Exposition is pull-less: the
//! dashboard process calls `gather_text()` and inlines the output.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Gauge, HistogramVec, TextEncoder,
};

lazy_static! {
    /// API requests by endpoint and outcome
    /// Labels: endpoint (user/games/tournaments/chat/mod), outcome (ok/429/error)
    pub static ref API_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "arbiter_api_requests_total",
        "Total API requests by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .unwrap();

    /// API request duration by endpoint
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "arbiter_api_request_duration_seconds",
        "API request latency by endpoint",
        &["endpoint"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Retries performed, by attempt number
    pub static ref API_RETRIES_TOTAL: CounterVec = register_counter_vec!(
        "arbiter_api_retries_total",
        "Total retry attempts by attempt number",
        &["attempt"]
    )
    .unwrap();

    /// Chat lines run through the classifier
    pub static ref CHAT_CLASSIFIED_TOTAL: CounterVec = register_counter_vec!(
        "arbiter_chat_classified_total",
        "Chat lines classified, by verdict (clean/reported/actionable)",
        &["verdict"]
    )
    .unwrap();

    /// Alerts emitted to moderators, by top category
    pub static ref CHAT_ALERTS_TOTAL: CounterVec = register_counter_vec!(
        "arbiter_chat_alerts_total",
        "Chat alerts emitted by top scoring category",
        &["category"]
    )
    .unwrap();

    /// Auto timeouts issued (or suppressed by cooldown)
    pub static ref CHAT_TIMEOUTS_TOTAL: CounterVec = register_counter_vec!(
        "arbiter_chat_timeouts_total",
        "Auto chat timeouts by outcome (issued/cooldown/disabled/failed)",
        &["outcome"]
    )
    .unwrap();

    /// Tournaments currently tracked by the poller
    pub static ref TRACKED_TOURNAMENTS: Gauge = register_gauge!(
        "arbiter_tracked_tournaments",
        "Number of tournaments currently tracked by the chat poller"
    )
    .unwrap();

    /// Cache lookups by cache name and result
    pub static ref CACHE_LOOKUPS_TOTAL: CounterVec = register_counter_vec!(
        "arbiter_cache_lookups_total",
        "TTL cache lookups by cache and result (hit/miss)",
        &["cache", "result"]
    )
    .unwrap();
}

/// Render all registered metrics in Prometheus text exposition format.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    encoder.encode_to_string(&families).unwrap_or_default()
}
