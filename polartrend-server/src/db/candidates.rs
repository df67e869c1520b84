//! Staged candidate mentions (pre-trend)

use anyhow::Result;
use chrono::{DateTime, Utc};
use polartrend_common::db::models::CandidateMention;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn candidate_from_row(row: &SqliteRow) -> Result<CandidateMention> {
    let id: String = row.get("id");

    Ok(CandidateMention {
        id: Uuid::parse_str(&id)?,
        candidate: row.get("candidate"),
        subreddit: row.get("subreddit"),
        post_title: row.get("post_title"),
        post_url: row.get("post_url"),
        mentioned_at: row.get("mentioned_at"),
    })
}

/// Whether a post URL has already been staged
pub async fn exists_by_url(pool: &SqlitePool, post_url: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM reddit_candidate_mentions WHERE post_url = ?)",
    )
    .bind(post_url)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Stage a candidate mention; duplicate URLs are ignored
pub async fn insert_candidate(pool: &SqlitePool, candidate: &CandidateMention) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO reddit_candidate_mentions (
            id, candidate, subreddit, post_title, post_url, mentioned_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(candidate.id.to_string())
    .bind(&candidate.candidate)
    .bind(&candidate.subreddit)
    .bind(&candidate.post_title)
    .bind(&candidate.post_url)
    .bind(candidate.mentioned_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Count staged candidates for a keyword observed at or after `since`
pub async fn count_for_keyword_since(
    pool: &SqlitePool,
    keyword: &str,
    since: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reddit_candidate_mentions WHERE candidate = ? AND mentioned_at >= ?",
    )
    .bind(keyword)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// All staged candidates for a keyword
pub async fn list_for_keyword(pool: &SqlitePool, keyword: &str) -> Result<Vec<CandidateMention>> {
    let rows = sqlx::query(
        "SELECT id, candidate, subreddit, post_title, post_url, mentioned_at
         FROM reddit_candidate_mentions
         WHERE candidate = ?
         ORDER BY mentioned_at DESC",
    )
    .bind(keyword)
    .fetch_all(pool)
    .await?;

    rows.iter().map(candidate_from_row).collect()
}

/// Remove all staged candidates for a keyword after promotion
pub async fn delete_for_keyword(pool: &SqlitePool, keyword: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM reddit_candidate_mentions WHERE candidate = ?")
        .bind(keyword)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
