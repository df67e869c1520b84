//! Reddit listing API client
//!
//! Read-only GET against the public JSON listing endpoint, one request per
//! subreddit per tick, with a fixed user agent and bounded timeout.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const REDDIT_BASE_URL: &str = "https://www.reddit.com";
const USER_AGENT: &str = "polartrend-bot/1.0";
const FETCH_TIMEOUT_SECS: u64 = 8;
const RATE_LIMIT_MS: u64 = 1000; // 1 request per second

/// Reddit client errors
#[derive(Debug, Error)]
pub enum RedditError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Subreddit not found: {0}")]
    SubredditNotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One post extracted from a subreddit listing
#[derive(Debug, Clone)]
pub struct RedditPost {
    pub subreddit: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    created_utc: f64,
}

/// Rate limiter enforcing a minimum interval between outbound requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Reddit listing API client
pub struct RedditClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl RedditClient {
    pub fn new() -> Result<Self, RedditError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| RedditError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    /// Fetch the newest posts from a subreddit
    pub async fn fetch_new_posts(
        &self,
        subreddit: &str,
        limit: i64,
    ) -> Result<Vec<RedditPost>, RedditError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/r/{}/new.json?limit={}", REDDIT_BASE_URL, subreddit, limit);

        tracing::debug!(subreddit = %subreddit, url = %url, "Fetching subreddit listing");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| RedditError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 404 {
            return Err(RedditError::SubredditNotFound(subreddit.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RedditError::ApiError(status.as_u16(), error_text));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| RedditError::ParseError(e.to_string()))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| post_from_data(child.data))
            .collect())
    }
}

fn post_from_data(data: PostData) -> RedditPost {
    let created_at = Utc
        .timestamp_opt(data.created_utc as i64, 0)
        .single()
        .unwrap_or_else(Utc::now);

    RedditPost {
        subreddit: data.subreddit,
        title: data.title,
        url: format!("{}{}", REDDIT_BASE_URL, data.permalink),
        created_at,
    }
}
