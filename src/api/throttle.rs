//! Per-endpoint request pacing.
//!
//! The platform API rate-limits per endpoint family, not per connection, so
//! every caller in the process shares one `Throttle`. Each endpoint keeps a
//! rolling window of send timestamps; `acquire()` sleeps until a slot in the
//! window frees up. A 429 response additionally blocks the endpoint for a
//! penalty period via `penalize()`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::config;

/// Named endpoint families, each with its own rate window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// User profile and rating history reads
    User,
    /// Game export (NDJSON) reads
    Games,
    /// Tournament list and standings reads
    Tournament,
    /// Tournament chat reads
    Chat,
    /// Mod actions: timeouts, message deletion
    Mod,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::User => "user",
            Endpoint::Games => "games",
            Endpoint::Tournament => "tournament",
            Endpoint::Chat => "chat",
            Endpoint::Mod => "mod",
        }
    }
}

/// One endpoint's rolling window state.
#[derive(Debug)]
struct Window {
    max_requests: u32,
    window: Duration,
    stamps: VecDeque<Instant>,
    /// Set by `penalize()` after a 429; `acquire()` waits it out.
    blocked_until: Option<Instant>,
}

impl Window {
    fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            stamps: VecDeque::new(),
            blocked_until: None,
        }
    }

    /// Drop timestamps that have aged out of the window.
    fn prune(&mut self, now: Instant) {
        while let Some(&front) = self.stamps.front() {
            if now.duration_since(front) >= self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Try to claim a slot now. On failure returns how long to wait
    /// before trying again.
    fn try_claim(&mut self, now: Instant) -> Result<(), Duration> {
        if let Some(until) = self.blocked_until {
            if now < until {
                return Err(until - now);
            }
            self.blocked_until = None;
        }

        self.prune(now);
        if (self.stamps.len() as u32) < self.max_requests {
            self.stamps.push_back(now);
            Ok(())
        } else {
            // Oldest stamp leaving the window frees the next slot
            let front = self.stamps.front().copied().unwrap_or(now);
            Err((front + self.window).saturating_duration_since(now))
        }
    }
}

/// Shared per-endpoint throttle. Cheap to clone.
#[derive(Clone)]
pub struct Throttle {
    windows: Arc<Mutex<HashMap<Endpoint, Window>>>,
}

impl Throttle {
    /// Build a throttle with the configured production windows: a shared
    /// public-read budget and a much tighter mod-action budget.
    pub fn new() -> Self {
        Self::with_limits(&[
            (
                Endpoint::User,
                config::throttle::PUBLIC_MAX_REQUESTS,
                config::throttle::public_window(),
            ),
            (
                Endpoint::Games,
                config::throttle::PUBLIC_MAX_REQUESTS,
                config::throttle::public_window(),
            ),
            (
                Endpoint::Tournament,
                config::throttle::PUBLIC_MAX_REQUESTS,
                config::throttle::public_window(),
            ),
            (
                Endpoint::Chat,
                config::throttle::PUBLIC_MAX_REQUESTS,
                config::throttle::public_window(),
            ),
            (
                Endpoint::Mod,
                config::throttle::MOD_MAX_REQUESTS,
                config::throttle::mod_window(),
            ),
        ])
    }

    /// Build a throttle with explicit per-endpoint limits (tests, tooling).
    pub fn with_limits(limits: &[(Endpoint, u32, Duration)]) -> Self {
        let mut windows = HashMap::new();
        for &(endpoint, max, window) in limits {
            windows.insert(endpoint, Window::new(max, window));
        }
        Self {
            windows: Arc::new(Mutex::new(windows)),
        }
    }

    /// Wait until a request slot for `endpoint` is available, then claim it.
    ///
    /// Unknown endpoints pass through unthrottled.
    pub async fn acquire(&self, endpoint: Endpoint) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                match windows.get_mut(&endpoint) {
                    Some(w) => match w.try_claim(Instant::now()) {
                        Ok(()) => return,
                        Err(wait) => wait,
                    },
                    None => return,
                }
            };
            // Sleep outside the lock so other endpoints keep flowing
            tokio::time::sleep(wait).await;
        }
    }

    /// Block `endpoint` for `penalty` from now. Called on HTTP 429.
    pub async fn penalize(&self, endpoint: Endpoint, penalty: Duration) {
        let mut windows = self.windows.lock().await;
        if let Some(w) = windows.get_mut(&endpoint) {
            let until = Instant::now() + penalty;
            // Never shorten an existing block
            if w.blocked_until.map_or(true, |cur| until > cur) {
                w.blocked_until = Some(until);
            }
            log::warn!("Endpoint '{}' penalized for {:?}", endpoint.as_str(), penalty);
        }
    }

    /// Requests currently counted in the endpoint's window (diagnostics).
    pub async fn in_flight(&self, endpoint: Endpoint) -> usize {
        let mut windows = self.windows.lock().await;
        match windows.get_mut(&endpoint) {
            Some(w) => {
                w.prune(Instant::now());
                w.stamps.len()
            }
            None => 0,
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Throttle {
        Throttle::with_limits(&[(Endpoint::User, 2, Duration::from_millis(100))])
    }

    #[tokio::test]
    async fn test_acquire_within_budget_is_immediate() {
        let t = tiny();
        let start = Instant::now();
        t.acquire(Endpoint::User).await;
        t.acquire(Endpoint::User).await;
        assert!(start.elapsed() < Duration::from_millis(50));
        assert_eq!(t.in_flight(Endpoint::User).await, 2);
    }

    #[tokio::test]
    async fn test_acquire_over_budget_waits_for_window() {
        let t = tiny();
        t.acquire(Endpoint::User).await;
        t.acquire(Endpoint::User).await;

        let start = Instant::now();
        t.acquire(Endpoint::User).await;
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_unthrottled() {
        let t = tiny();
        let start = Instant::now();
        for _ in 0..20 {
            t.acquire(Endpoint::Mod).await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_penalty_blocks_endpoint() {
        let t = tiny();
        t.penalize(Endpoint::User, Duration::from_millis(120)).await;

        let start = Instant::now();
        t.acquire(Endpoint::User).await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_endpoints_are_independent() {
        let t = Throttle::with_limits(&[
            (Endpoint::User, 1, Duration::from_secs(5)),
            (Endpoint::Chat, 5, Duration::from_secs(5)),
        ]);
        t.acquire(Endpoint::User).await;

        // User is exhausted but Chat must not be affected
        let start = Instant::now();
        t.acquire(Endpoint::Chat).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
