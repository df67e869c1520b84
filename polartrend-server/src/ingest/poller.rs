//! Fixed-interval Reddit ingestion poller
//!
//! Each tick stages keyword-matching posts as candidate mentions, then
//! promotes keywords whose staged volume clears the threshold into trend
//! records. A failed fetch for one subreddit is logged and does not abort
//! the rest of the tick.

use crate::db::{candidates, settings};
use crate::ingest::reddit::{RedditClient, RedditPost};
use crate::service::{self, NewTrend};
use crate::db::{mentions, trends};
use crate::similarity::SimilarityEngine;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use polartrend_common::db::models::{CandidateMention, RedditMention};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Reddit ingestion poller
pub struct IngestPoller {
    db: SqlitePool,
    engine: SimilarityEngine,
    client: Arc<RedditClient>,
    subreddits: Vec<String>,
    /// Attribution priority order; first match wins
    keywords: Vec<String>,
}

impl IngestPoller {
    pub fn new(
        db: SqlitePool,
        engine: SimilarityEngine,
        client: RedditClient,
        subreddits: Vec<String>,
        keywords: Vec<String>,
    ) -> Self {
        Self {
            db,
            engine,
            client: Arc::new(client),
            subreddits,
            keywords,
        }
    }

    /// Run the poller forever; interval is read from settings each tick
    pub async fn run(self) {
        loop {
            let interval_secs = settings::get_i64(&self.db, "poll_interval_secs", 30)
                .await
                .max(1);
            tokio::time::sleep(std::time::Duration::from_secs(interval_secs as u64)).await;

            if let Err(e) = self.scan_once().await {
                error!(error = %e, "Reddit scan tick failed");
            }
        }
    }

    /// One full tick: collect candidates from every subreddit, then promote
    pub async fn scan_once(&self) -> Result<usize> {
        info!("Scanning Reddit for keyword mentions");

        let page_size = settings::get_i64(&self.db, "reddit_page_size", 25).await;

        for subreddit in &self.subreddits {
            match self.client.fetch_new_posts(subreddit, page_size).await {
                Ok(posts) => {
                    let staged = self.stage_posts(&posts).await?;
                    debug!(subreddit = %subreddit, staged, "Subreddit scanned");
                }
                Err(e) => {
                    // Network failure for one subreddit must not abort the rest
                    warn!(subreddit = %subreddit, error = %e, "Failed to fetch subreddit");
                }
            }
        }

        self.promote_candidates().await
    }

    /// Match a post title against the keyword list; first match wins
    fn match_keyword(&self, title: &str) -> Option<&str> {
        let lower = title.to_lowercase();
        self.keywords
            .iter()
            .find(|keyword| lower.contains(keyword.as_str()))
            .map(|k| k.as_str())
    }

    /// Stage keyword-matching posts as candidate mentions
    ///
    /// Posts whose URL is already staged are skipped; returns the number of
    /// newly staged candidates.
    pub async fn stage_posts(&self, posts: &[RedditPost]) -> Result<usize> {
        let mut staged = 0usize;

        for post in posts {
            let Some(keyword) = self.match_keyword(&post.title) else {
                continue;
            };

            if candidates::exists_by_url(&self.db, &post.url).await? {
                continue;
            }

            let candidate = CandidateMention {
                id: Uuid::new_v4(),
                candidate: keyword.to_string(),
                subreddit: post.subreddit.clone(),
                post_title: post.title.clone(),
                post_url: post.url.clone(),
                mentioned_at: post.created_at,
            };

            if candidates::insert_candidate(&self.db, &candidate).await? {
                staged += 1;
                debug!(keyword = %keyword, subreddit = %post.subreddit, "Candidate staged");
            }
        }

        Ok(staged)
    }

    /// Promote keywords whose staged volume clears the threshold
    ///
    /// Creates at most one trend per keyword per hour (hourly-bucketed
    /// title), copies every staged candidate for the keyword into permanent
    /// mention records, then deletes the staged rows. Returns the number of
    /// trends created.
    pub async fn promote_candidates(&self) -> Result<usize> {
        let threshold = settings::get_i64(&self.db, "trend_threshold", 1).await;
        let window_minutes = settings::get_i64(&self.db, "candidate_window_minutes", 1440).await;
        let window_start = Utc::now() - Duration::minutes(window_minutes);

        let mut created = 0usize;

        for keyword in &self.keywords {
            let count =
                candidates::count_for_keyword_since(&self.db, keyword, window_start).await?;

            debug!(keyword = %keyword, count, "Candidate mention count");

            if count < threshold {
                continue;
            }

            let title = hourly_trend_title(keyword, Utc::now());
            if trends::get_trend_by_title(&self.db, &title).await?.is_some() {
                continue;
            }

            let trend = service::create_trend(
                &self.db,
                &self.engine,
                NewTrend {
                    title: title.clone(),
                    mentions_24h: count,
                    description: Some(format!("Auto detected trend for keyword \"{}\"", keyword)),
                },
            )
            .await?;

            info!(title = %title, mentions = count, "Trend created from candidates");
            created += 1;

            // Attach every staged candidate as a proof mention, then clean up
            let proofs = candidates::list_for_keyword(&self.db, keyword).await?;
            for proof in &proofs {
                let mention = RedditMention {
                    id: Uuid::new_v4(),
                    trend_id: trend.id,
                    subreddit: proof.subreddit.clone(),
                    post_title: proof.post_title.clone(),
                    post_url: proof.post_url.clone(),
                    mentioned_at: proof.mentioned_at,
                };
                mentions::insert_mention(&self.db, &mention).await?;
            }

            candidates::delete_for_keyword(&self.db, keyword).await?;
            debug!(keyword = %keyword, proofs = proofs.len(), "Candidates promoted and cleaned");
        }

        Ok(created)
    }
}

/// Hourly-bucketed trend title for a keyword
///
/// At most one trend per keyword per hour can exist under this scheme.
pub fn hourly_trend_title(keyword: &str, now: DateTime<Utc>) -> String {
    format!("Trend: {} @ {}", keyword, now.format("%Y-%m-%dT%H"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_hourly_trend_title_bucket() {
        let at = Utc.with_ymd_and_hms(2025, 11, 2, 9, 41, 7).unwrap();
        assert_eq!(hourly_trend_title("rag", at), "Trend: rag @ 2025-11-02T09");

        // Same hour, different minute: same title
        let later = Utc.with_ymd_and_hms(2025, 11, 2, 9, 59, 59).unwrap();
        assert_eq!(hourly_trend_title("rag", at), hourly_trend_title("rag", later));
    }
}
