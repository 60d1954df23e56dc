use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Base URL of the platform API
/// Read from ARBITER_API_BASE environment variable
/// Default: https://chess.example.org/api
pub static API_BASE: Lazy<String> =
    Lazy::new(|| env::var("ARBITER_API_BASE").unwrap_or_else(|_| "https://chess.example.org/api".to_string()));

/// OAuth bearer token for mod-scoped API calls
/// Read from ARBITER_API_TOKEN environment variable
/// Without it, public endpoints still work but mod actions (timeouts,
/// message deletion) will be rejected by the server
pub static API_TOKEN: Lazy<Option<String>> = Lazy::new(|| env::var("ARBITER_API_TOKEN").ok());

/// User agent sent on every request
/// Read from ARBITER_USER_AGENT environment variable
pub static USER_AGENT: Lazy<String> =
    Lazy::new(|| env::var("ARBITER_USER_AGENT").unwrap_or_else(|_| "arbiter-mod-dashboard".to_string()));

/// Log file path
/// Read from ARBITER_LOG_FILE environment variable
/// Default: arbiter.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("ARBITER_LOG_FILE").unwrap_or_else(|_| "arbiter.log".to_string()));

/// Whether auto chat timeouts are enabled
/// Read from ARBITER_AUTO_TIMEOUT environment variable ("1"/"true")
/// Default: off, alerts only
pub static AUTO_TIMEOUT: Lazy<bool> = Lazy::new(|| {
    env::var("ARBITER_AUTO_TIMEOUT")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
});

/// Per-endpoint throttle configuration
pub mod throttle {
    use super::Duration;

    /// Max requests per window for public read endpoints
    pub const PUBLIC_MAX_REQUESTS: u32 = 15;

    /// Window length for public read endpoints (in seconds)
    pub const PUBLIC_WINDOW_SECS: u64 = 10;

    /// Max requests per window for mod action endpoints
    /// Kept deliberately low: timeouts are the only writes we issue
    pub const MOD_MAX_REQUESTS: u32 = 4;

    /// Window length for mod action endpoints (in seconds)
    pub const MOD_WINDOW_SECS: u64 = 10;

    /// Penalty sleep after an HTTP 429 without a Retry-After hint (in seconds)
    pub const PENALTY_SECS: u64 = 60;

    pub fn public_window() -> Duration {
        Duration::from_secs(PUBLIC_WINDOW_SECS)
    }

    pub fn mod_window() -> Duration {
        Duration::from_secs(MOD_WINDOW_SECS)
    }

    pub fn penalty() -> Duration {
        Duration::from_secs(PENALTY_SECS)
    }
}

/// Tournament poller configuration
pub mod poller {
    use super::Duration;

    /// Interval between poller cycles (in seconds)
    pub const CYCLE_SECS: u64 = 10;

    /// Interval between active tournament list refreshes (in seconds)
    pub const REFRESH_SECS: u64 = 120;

    /// Minimum chat poll interval per tournament (in seconds)
    pub const MIN_POLL_SECS: u64 = 20;

    /// Maximum chat poll interval after idle backoff (in seconds)
    pub const MAX_POLL_SECS: u64 = 320;

    /// Lead window before a tournament starts during which we already poll (in seconds)
    pub const LEAD_SECS: i64 = 900;

    /// Grace period after a tournament finishes before it is dropped (in seconds)
    pub const FINISH_GRACE_SECS: i64 = 600;

    /// Consecutive chat fetch errors before a tournament is dropped
    pub const MAX_CONSECUTIVE_ERRORS: u32 = 5;

    pub fn cycle() -> Duration {
        Duration::from_secs(CYCLE_SECS)
    }

    pub fn refresh_interval() -> Duration {
        Duration::from_secs(REFRESH_SECS)
    }
}

/// Chat classifier tuning
///
/// Opaque business tunables. The values here are what the mod team runs;
/// change them in one place only.
pub mod chat {
    /// Total score at which a line is reported to moderators
    pub const REPORT_THRESHOLD: f64 = 2.0;

    /// Total score at which an auto timeout is issued (if enabled)
    pub const ACTION_THRESHOLD: f64 = 5.0;

    /// Gibberish score (0..1) above which the Gibberish category is credited
    pub const GIBBERISH_THRESHOLD: f64 = 0.65;

    /// Weight credited to the Gibberish category per flagged line
    pub const GIBBERISH_WEIGHT: f64 = 1.5;

    /// Messages shorter than this many letters are never gibberish-checked
    pub const GIBBERISH_MIN_LETTERS: usize = 8;

    /// Cooldown between auto timeouts of the same user (in seconds)
    pub const TIMEOUT_COOLDOWN_SECS: u64 = 600;

    /// Duration of an issued chat timeout (in minutes)
    pub const TIMEOUT_MINUTES: u32 = 10;
}

/// Per-user detection tuning (alt fingerprinting, boost/sandbag scoring)
pub mod detect {
    /// Recent games fetched per user for aggregation
    pub const MAX_GAMES: u32 = 200;

    /// Plies at or under which a decisive loss counts as a dumped game
    pub const DUMP_PLY_THRESHOLD: u32 = 20;

    /// Sliding window (games) for the largest-rating-drop signal
    pub const DROP_WINDOW: usize = 15;

    /// MAD units of downward rating deviation considered anomalous
    pub const MAD_DEVIATION_LIMIT: f64 = 4.0;

    /// First plies per color used for the repertoire histogram
    pub const REPERTOIRE_PLIES: usize = 2;

    /// Fingerprint similarity above which a pair is surfaced for review
    pub const ALT_SIMILARITY_THRESHOLD: f64 = 0.82;
}

/// Response cache TTLs
pub mod cache {
    use super::Duration;

    /// TTL for cached game exports (in seconds)
    pub const GAMES_TTL_SECS: u64 = 600;

    /// TTL for cached user profiles (in seconds)
    pub const PROFILE_TTL_SECS: u64 = 300;

    /// TTL for cached rating histories (in seconds)
    pub const RATING_HISTORY_TTL_SECS: u64 = 1800;

    pub fn games_ttl() -> Duration {
        Duration::from_secs(GAMES_TTL_SECS)
    }

    pub fn profile_ttl() -> Duration {
        Duration::from_secs(PROFILE_TTL_SECS)
    }

    pub fn rating_history_ttl() -> Duration {
        Duration::from_secs(RATING_HISTORY_TTL_SECS)
    }
}
