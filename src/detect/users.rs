//! Cached access to user profiles and rating histories.
//!
//! Same fetch-through shape as the games export: moderators open the same
//! user's report several times in a row, so both lookups go through their
//! TTL caches and only hit the API once per window.

use std::sync::Arc;

use crate::api::types::{RatingHistory, UserProfile};
use crate::api::{ApiClient, ApiError};
use crate::storage::cache::{PROFILE_CACHE, RATING_HISTORY_CACHE};

/// Public profile for `username`, through the cache.
pub async fn profile(api: &ApiClient, username: &str) -> Result<Arc<UserProfile>, ApiError> {
    let key = username.to_lowercase();
    if let Some(profile) = PROFILE_CACHE.get(&key).await {
        return Ok(profile);
    }

    let profile = Arc::new(api.user_profile(username).await?);
    PROFILE_CACHE.set(key, profile.clone()).await;
    log::debug!("Fetched profile for '{}'", username);
    Ok(profile)
}

/// Rating history for `username` (one series per pool), through the cache.
pub async fn rating_history(api: &ApiClient, username: &str) -> Result<Arc<Vec<RatingHistory>>, ApiError> {
    let key = username.to_lowercase();
    if let Some(history) = RATING_HISTORY_CACHE.get(&key).await {
        return Ok(history);
    }

    let history = Arc::new(api.rating_history(username).await?);
    RATING_HISTORY_CACHE.set(key, history.clone()).await;
    log::debug!("Fetched rating history for '{}'", username);
    Ok(history)
}
