//! Integration tests for the API plumbing: throttle, caches, NDJSON
//!
//! Run with: cargo test --test engine_test

use std::time::Duration;

use arbiter::api::ndjson;
use arbiter::api::types::ExportedGame;
use arbiter::api::{validate_username, Endpoint, Throttle};
use arbiter::storage::TtlCache;

// ============================================================================
// Throttle under concurrency
// ============================================================================

mod throttle {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_budget() {
        let throttle = Throttle::with_limits(&[(Endpoint::Games, 3, Duration::from_millis(200))]);

        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..6 {
            let t = throttle.clone();
            handles.push(tokio::spawn(async move {
                t.acquire(Endpoint::Games).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // 6 requests through a 3-per-200ms window needs a second window
        assert!(start.elapsed() >= Duration::from_millis(180));
        assert!(start.elapsed() < Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_penalty_delays_all_callers() {
        let throttle = Throttle::with_limits(&[(Endpoint::Chat, 10, Duration::from_millis(50))]);
        throttle.penalize(Endpoint::Chat, Duration::from_millis(150)).await;

        let start = Instant::now();
        throttle.acquire(Endpoint::Chat).await;
        assert!(start.elapsed() >= Duration::from_millis(130));
    }
}

// ============================================================================
// TTL cache behavior
// ============================================================================

mod cache {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_cache_shared_across_tasks() {
        let cache: Arc<TtlCache<u64>> = Arc::new(TtlCache::new("it", Duration::from_secs(60)));
        cache.set("seed", 7).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let c = cache.clone();
            handles.push(tokio::spawn(async move { c.get("seed").await }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap(), Some(7));
        }
    }

    #[tokio::test]
    async fn test_expired_entries_vanish_without_cleanup() {
        let cache: TtlCache<String> = TtlCache::new("it", Duration::from_millis(20));
        cache.set("u", "profile".into()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get("u").await.is_none());
    }
}

// ============================================================================
// NDJSON decoding against realistic export bodies
// ============================================================================

mod ndjson_decoding {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;
    use pretty_assertions::assert_eq;

    const GAME_LINE: &str = r#"{"id":"x1","rated":true,"speed":"blitz","perf":"blitz","createdAt":1700000000000,"status":"mate","winner":"white","players":{"white":{"user":{"name":"a"},"rating":1700},"black":{"user":{"name":"b"},"rating":1690}},"moves":"e4 e5"}"#;

    #[tokio::test]
    async fn test_export_body_decodes_through_chunk_boundaries() {
        let body = format!("{GAME_LINE}\n\n{GAME_LINE}\n");
        // Slice the body into awkward 7-byte chunks
        let chunks: Vec<Result<Bytes, reqwest::Error>> = body
            .as_bytes()
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();

        let games: Vec<ExportedGame> = ndjson::collect(stream::iter(chunks), 100).await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].players.white.rating, Some(1700));
        assert_eq!(games[1].plies(), 2);
    }

    #[tokio::test]
    async fn test_single_chunk_body_decodes() {
        let body = format!("{GAME_LINE}\n{GAME_LINE}");
        let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![Ok(Bytes::from(body))];
        let games: Vec<ExportedGame> = ndjson::collect(stream::iter(chunks), 100).await.unwrap();
        assert_eq!(games.len(), 2);
    }
}

// ============================================================================
// Input validation at the API boundary
// ============================================================================

#[test]
fn test_usernames_that_must_never_reach_the_wire() {
    for bad in ["", "a", "user name", "user/../mod", "user%00", "ユーザー"] {
        assert!(validate_username(bad).is_err(), "accepted {bad:?}");
    }
    for good in ["ok", "Some_User-99", "a1"] {
        assert!(validate_username(good).is_ok(), "rejected {good:?}");
    }
}
