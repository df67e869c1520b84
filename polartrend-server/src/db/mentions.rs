//! Reddit mention persistence (append-only proof records)

use anyhow::Result;
use chrono::{DateTime, Utc};
use polartrend_common::db::models::RedditMention;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn mention_from_row(row: &SqliteRow) -> Result<RedditMention> {
    let id: String = row.get("id");
    let trend_id: String = row.get("trend_id");

    Ok(RedditMention {
        id: Uuid::parse_str(&id)?,
        trend_id: Uuid::parse_str(&trend_id)?,
        subreddit: row.get("subreddit"),
        post_title: row.get("post_title"),
        post_url: row.get("post_url"),
        mentioned_at: row.get("mentioned_at"),
    })
}

/// Save a mention; duplicates (same trend + post URL) are ignored
///
/// Returns true when a new row was written.
pub async fn insert_mention(pool: &SqlitePool, mention: &RedditMention) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO reddit_mentions (
            id, trend_id, subreddit, post_title, post_url, mentioned_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(mention.id.to_string())
    .bind(mention.trend_id.to_string())
    .bind(&mention.subreddit)
    .bind(&mention.post_title)
    .bind(&mention.post_url)
    .bind(mention.mentioned_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Total mentions attached to a trend
pub async fn count_for_trend(pool: &SqlitePool, trend_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reddit_mentions WHERE trend_id = ?")
        .bind(trend_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Mentions attached to a trend observed at or after `since`
pub async fn count_recent(pool: &SqlitePool, trend_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reddit_mentions WHERE trend_id = ? AND mentioned_at >= ?",
    )
    .bind(trend_id.to_string())
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Latest mentions for a trend, newest first
pub async fn latest_for_trend(
    pool: &SqlitePool,
    trend_id: Uuid,
    limit: i64,
) -> Result<Vec<RedditMention>> {
    let rows = sqlx::query(
        "SELECT id, trend_id, subreddit, post_title, post_url, mentioned_at
         FROM reddit_mentions
         WHERE trend_id = ?
         ORDER BY mentioned_at DESC
         LIMIT ?",
    )
    .bind(trend_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(mention_from_row).collect()
}

/// Total mention count across all trends
pub async fn count_total(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reddit_mentions")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
