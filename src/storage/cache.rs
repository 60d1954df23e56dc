//! TTL response caches.
//!
//! The dashboard re-renders reports far more often than the underlying data
//! changes, so API responses are cached in-process with per-cache TTLs.
//! Keys are strings (username, or username plus query parameters); values
//! are whatever the caller stored, cloned out on hit.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::api::types::{ExportedGame, RatingHistory, UserProfile};
use crate::core::{config, metrics};

struct Entry<V> {
    value: V,
    cached_at: Instant,
}

/// String-keyed in-memory cache with TTL eviction and hit/miss counters.
pub struct TtlCache<V> {
    name: &'static str,
    cache: Arc<Mutex<HashMap<String, Entry<V>>>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            cache: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Returns the cached value, or None if absent or expired.
    /// Expired entries are removed on access.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut cache = self.cache.lock().await;

        if let Some(entry) = cache.get(key) {
            if entry.cached_at.elapsed() < self.ttl {
                metrics::CACHE_LOOKUPS_TOTAL.with_label_values(&[self.name, "hit"]).inc();
                return Some(entry.value.clone());
            }
            cache.remove(key);
        }

        metrics::CACHE_LOOKUPS_TOTAL.with_label_values(&[self.name, "miss"]).inc();
        None
    }

    pub async fn set(&self, key: impl Into<String>, value: V) {
        let mut cache = self.cache.lock().await;
        cache.insert(
            key.into(),
            Entry {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Sweep expired entries. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let mut cache = self.cache.lock().await;
        let before = cache.len();
        cache.retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        let removed = before - cache.len();
        if removed > 0 {
            log::debug!("Cache '{}': evicted {} expired entries", self.name, removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }
}

/// Recent-games cache, keyed by `username:max:perf`.
pub static GAMES_CACHE: Lazy<TtlCache<Arc<Vec<ExportedGame>>>> =
    Lazy::new(|| TtlCache::new("games", config::cache::games_ttl()));

/// User profile cache, keyed by lowercase username.
pub static PROFILE_CACHE: Lazy<TtlCache<Arc<UserProfile>>> =
    Lazy::new(|| TtlCache::new("profile", config::cache::profile_ttl()));

/// Rating history cache, keyed by lowercase username.
pub static RATING_HISTORY_CACHE: Lazy<TtlCache<Arc<Vec<RatingHistory>>>> =
    Lazy::new(|| TtlCache::new("rating_history", config::cache::rating_history_ttl()));

/// Games-cache key for a fetch request.
pub fn games_key(username: &str, max: u32, perf: Option<&str>) -> String {
    format!("{}:{}:{}", username.to_lowercase(), max, perf.unwrap_or("all"))
}

/// Sweep all domain caches. Called periodically by the poller task.
pub async fn cleanup_all() -> usize {
    GAMES_CACHE.cleanup().await + PROFILE_CACHE.cleanup().await + RATING_HISTORY_CACHE.cleanup().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let cache: TtlCache<String> = TtlCache::new("test", Duration::from_secs(60));
        assert!(cache.get("k").await.is_none());

        cache.set("k", "v".to_string()).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_expiry_removes_entry() {
        let cache: TtlCache<u32> = TtlCache::new("test", Duration::from_millis(30));
        cache.set("k", 1).await;
        assert_eq!(cache.get("k").await, Some(1));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.get("k").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_sweeps_expired() {
        let cache: TtlCache<u32> = TtlCache::new("test", Duration::from_millis(30));
        cache.set("a", 1).await;
        cache.set("b", 2).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.set("c", 3).await;

        assert_eq!(cache.cleanup().await, 2);
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn test_games_key_is_case_insensitive() {
        assert_eq!(games_key("Alice", 200, None), games_key("alice", 200, None));
        assert_ne!(games_key("alice", 200, None), games_key("alice", 200, Some("blitz")));
    }
}
