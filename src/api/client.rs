//! Rate-limited HTTP client for the platform API.
//!
//! Every call acquires a throttle slot for its endpoint family first, so
//! concurrent dashboard requests and the tournament poller share one budget.
//! 429 responses penalize the endpoint (default 60 s, `Retry-After`
//! honored) and are retried a bounded number of times; 5xx and transport
//! errors retry with exponential backoff.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use crate::api::ndjson;
use crate::api::throttle::{Endpoint, Throttle};
use crate::api::types::{ChatLine, ExportedGame, RatingHistory, TournamentIndex, UserProfile};
use crate::api::ApiError;
use crate::core::retry::{retry, RetryConfig};
use crate::core::{config, metrics};

const NDJSON_MIME: &str = "application/x-ndjson";

/// Shared API client. Cheap to clone; all clones share the throttle.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    throttle: Throttle,
    base: Url,
    retry: RetryConfig,
}

impl ApiClient {
    /// Build a client from the environment configuration.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base(config::API_BASE.as_str(), config::API_TOKEN.clone(), Throttle::new())
    }

    /// Build a client against an explicit base URL (tests, staging).
    pub fn with_base(base: &str, token: Option<String>, throttle: Throttle) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::BadRequest("API token contains invalid header bytes".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(config::USER_AGENT.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        let mut base = Url::parse(base)?;
        // Trailing slash so Url::join keeps the /api prefix
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(Self {
            http,
            throttle,
            base,
            retry: RetryConfig::network().max_retries(3),
        })
    }

    /// Override the retry policy (tests, latency-sensitive callers).
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Public user profile.
    pub async fn user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        validate_username(username)?;
        let url = self.url(&format!("user/{username}"))?;
        self.get_json(Endpoint::User, url).await
    }

    /// Rating history, one series per rating pool.
    pub async fn rating_history(&self, username: &str) -> Result<Vec<RatingHistory>, ApiError> {
        validate_username(username)?;
        let url = self.url(&format!("user/{username}/rating-history"))?;
        self.get_json(Endpoint::User, url).await
    }

    /// Recent rated games via the NDJSON export, newest first.
    pub async fn export_games(
        &self,
        username: &str,
        max: u32,
        perf: Option<&str>,
    ) -> Result<Vec<ExportedGame>, ApiError> {
        validate_username(username)?;
        let mut url = self.url(&format!("games/user/{username}"))?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("max", &max.to_string());
            q.append_pair("rated", "true");
            q.append_pair("moves", "true");
            if let Some(perf) = perf {
                q.append_pair("perfType", perf);
            }
        }

        let result = retry(&self.retry, || {
            let url = url.clone();
            async move {
                let resp = self.send(Endpoint::Games, self.http.get(url).header(ACCEPT, NDJSON_MIME)).await?;
                ndjson::collect(resp.bytes_stream(), max as usize).await
            }
        })
        .await;
        result.into_result()
    }

    /// Currently listed tournaments (created, started, recently finished).
    pub async fn tournament_index(&self) -> Result<TournamentIndex, ApiError> {
        let url = self.url("tournament")?;
        self.get_json(Endpoint::Tournament, url).await
    }

    /// Full recent chat of a tournament, oldest first.
    pub async fn tournament_chat(&self, tournament_id: &str) -> Result<Vec<ChatLine>, ApiError> {
        let url = self.url(&format!("tournament/{tournament_id}/chat"))?;
        self.get_json(Endpoint::Chat, url).await
    }

    /// Issue a chat timeout against a user in a tournament chat.
    ///
    /// Mod-scoped: requires the bearer token. The caller is responsible for
    /// cooldown gating (`chat::timeout`).
    pub async fn timeout_user(
        &self,
        tournament_id: &str,
        username: &str,
        reason: &str,
        minutes: u32,
    ) -> Result<(), ApiError> {
        validate_username(username)?;
        let url = self.url(&format!("mod/chat/{tournament_id}/timeout"))?;
        let body = serde_json::json!({
            "user": username,
            "reason": reason,
            "minutes": minutes,
        });

        let result = retry(&self.retry, || {
            let url = url.clone();
            let body = body.clone();
            async move {
                self.send(Endpoint::Mod, self.http.post(url).json(&body)).await?;
                Ok::<_, ApiError>(())
            }
        })
        .await;
        result.into_result()
    }

    /// Delete a single chat message by its index in the tournament chat.
    pub async fn delete_chat_message(&self, tournament_id: &str, index: usize) -> Result<(), ApiError> {
        let url = self.url(&format!("mod/chat/{tournament_id}/delete/{index}"))?;
        let result = retry(&self.retry, || {
            let url = url.clone();
            async move {
                self.send(Endpoint::Mod, self.http.post(url)).await?;
                Ok::<_, ApiError>(())
            }
        })
        .await;
        result.into_result()
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: Endpoint, url: Url) -> Result<T, ApiError> {
        let result = retry(&self.retry, || {
            let url = url.clone();
            async move {
                let resp = self.send(endpoint, self.http.get(url)).await?;
                Ok::<T, ApiError>(resp.json().await?)
            }
        })
        .await;
        result.into_result()
    }

    /// Throttle, send, and map the response status. All requests funnel
    /// through here so metrics and 429 handling live in one place.
    async fn send(&self, endpoint: Endpoint, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        self.throttle.acquire(endpoint).await;

        let started = Instant::now();
        let resp = req.send().await;
        metrics::API_REQUEST_DURATION_SECONDS
            .with_label_values(&[endpoint.as_str()])
            .observe(started.elapsed().as_secs_f64());

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                metrics::API_REQUESTS_TOTAL
                    .with_label_values(&[endpoint.as_str(), "error"])
                    .inc();
                return Err(e.into());
            }
        };

        match resp.status() {
            status if status.is_success() => {
                metrics::API_REQUESTS_TOTAL
                    .with_label_values(&[endpoint.as_str(), "ok"])
                    .inc();
                Ok(resp)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or_else(config::throttle::penalty);

                metrics::API_REQUESTS_TOTAL
                    .with_label_values(&[endpoint.as_str(), "429"])
                    .inc();
                self.throttle.penalize(endpoint, retry_after).await;
                Err(ApiError::RateLimited { retry_after })
            }
            StatusCode::NOT_FOUND => {
                metrics::API_REQUESTS_TOTAL
                    .with_label_values(&[endpoint.as_str(), "error"])
                    .inc();
                Err(ApiError::NotFound(resp.url().path().to_string()))
            }
            status => {
                metrics::API_REQUESTS_TOTAL
                    .with_label_values(&[endpoint.as_str(), "error"])
                    .inc();
                Err(ApiError::Status(status))
            }
        }
    }
}

/// Usernames are path segments; reject anything that could not be one
/// before it reaches the wire.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    let ok_len = (2..=30).contains(&username.len());
    let ok_chars = username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok_len && ok_chars {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("invalid username: {username:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("magnus_c").is_ok());
        assert!(validate_username("a-1").is_ok());
        assert!(validate_username("x").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username("../../etc").is_err());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::with_base("https://example.org/api", None, Throttle::new()).unwrap();
        let url = client.url("user/foo").unwrap();
        assert_eq!(url.as_str(), "https://example.org/api/user/foo");
    }
}
