//! Cached access to a user's recent games.
//!
//! Both aggregators start from the same NDJSON export, and moderators run
//! them back to back on the same user, so the export goes through the games
//! TTL cache. Within the TTL a report recompute costs zero API requests.

use std::sync::Arc;

use crate::api::types::ExportedGame;
use crate::api::{ApiClient, ApiError};
use crate::storage::cache::{games_key, GAMES_CACHE};

/// Recent rated games for `username`, newest first, through the cache.
pub async fn recent_games(
    api: &ApiClient,
    username: &str,
    max: u32,
    perf: Option<&str>,
) -> Result<Arc<Vec<ExportedGame>>, ApiError> {
    let key = games_key(username, max, perf);
    if let Some(games) = GAMES_CACHE.get(&key).await {
        return Ok(games);
    }

    let games = Arc::new(api.export_games(username, max, perf).await?);
    GAMES_CACHE.set(key, games.clone()).await;
    log::debug!("Fetched {} games for '{}'", games.len(), username);
    Ok(games)
}
