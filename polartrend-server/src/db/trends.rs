//! Trend persistence

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use polartrend_common::classify::{AccuracyStatus, MaturityStage};
use polartrend_common::db::models::Trend;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

pub(crate) fn trend_from_row(row: &SqliteRow) -> Result<Trend> {
    let id: String = row.get("id");
    let stage: String = row.get("maturity_stage");
    let status: String = row.get("accuracy_status");

    Ok(Trend {
        id: Uuid::parse_str(&id)?,
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        mentions_24h: row.get("mentions_24h"),
        historical_count: row.get("historical_count"),
        maturity_stage: stage.parse::<MaturityStage>().map_err(|e| anyhow!(e))?,
        accuracy_status: status.parse::<AccuracyStatus>().map_err(|e| anyhow!(e))?,
        first_detected_at: row.get("first_detected_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const TREND_COLUMNS: &str = "id, title, slug, description, mentions_24h, historical_count, \
     maturity_stage, accuracy_status, first_detected_at, created_at, updated_at";

/// Save a new trend
pub async fn insert_trend(pool: &SqlitePool, trend: &Trend) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO trends (
            id, title, slug, description, mentions_24h, historical_count,
            maturity_stage, accuracy_status, first_detected_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(trend.id.to_string())
    .bind(&trend.title)
    .bind(&trend.slug)
    .bind(&trend.description)
    .bind(trend.mentions_24h)
    .bind(trend.historical_count)
    .bind(trend.maturity_stage.as_str())
    .bind(trend.accuracy_status.as_str())
    .bind(trend.first_detected_at)
    .bind(trend.created_at)
    .bind(trend.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a trend by id
pub async fn get_trend(pool: &SqlitePool, id: Uuid) -> Result<Option<Trend>> {
    let row = sqlx::query(&format!("SELECT {} FROM trends WHERE id = ?", TREND_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(trend_from_row).transpose()
}

/// Load a trend by exact title (used by the poller's hourly dedup)
pub async fn get_trend_by_title(pool: &SqlitePool, title: &str) -> Result<Option<Trend>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM trends WHERE title = ? LIMIT 1",
        TREND_COLUMNS
    ))
    .bind(title)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(trend_from_row).transpose()
}

/// Load every trend, newest first
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Trend>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM trends ORDER BY created_at DESC",
        TREND_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(trend_from_row).collect()
}

/// Count trends matching the optional classification filters
pub async fn count_filtered(
    pool: &SqlitePool,
    maturity_stage: Option<MaturityStage>,
    accuracy_status: Option<AccuracyStatus>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trends
         WHERE (? IS NULL OR maturity_stage = ?)
           AND (? IS NULL OR accuracy_status = ?)",
    )
    .bind(maturity_stage.map(|s| s.as_str()))
    .bind(maturity_stage.map(|s| s.as_str()))
    .bind(accuracy_status.map(|s| s.as_str()))
    .bind(accuracy_status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// List trends matching the optional classification filters, newest first
pub async fn list_filtered(
    pool: &SqlitePool,
    maturity_stage: Option<MaturityStage>,
    accuracy_status: Option<AccuracyStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Trend>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM trends
         WHERE (? IS NULL OR maturity_stage = ?)
           AND (? IS NULL OR accuracy_status = ?)
         ORDER BY created_at DESC
         LIMIT ? OFFSET ?",
        TREND_COLUMNS
    ))
    .bind(maturity_stage.map(|s| s.as_str()))
    .bind(maturity_stage.map(|s| s.as_str()))
    .bind(accuracy_status.map(|s| s.as_str()))
    .bind(accuracy_status.map(|s| s.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(trend_from_row).collect()
}

/// Apply an update to title/slug/description/mentions and both classifications
pub async fn update_trend(pool: &SqlitePool, trend: &Trend) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE trends
        SET title = ?, slug = ?, description = ?, mentions_24h = ?,
            maturity_stage = ?, accuracy_status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&trend.title)
    .bind(&trend.slug)
    .bind(&trend.description)
    .bind(trend.mentions_24h)
    .bind(trend.maturity_stage.as_str())
    .bind(trend.accuracy_status.as_str())
    .bind(Utc::now())
    .bind(trend.id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite a trend's live mention count and classifications (snapshot path)
pub async fn update_live_fields(
    pool: &SqlitePool,
    id: Uuid,
    mentions_24h: i64,
    maturity_stage: MaturityStage,
    accuracy_status: AccuracyStatus,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE trends
        SET mentions_24h = ?, maturity_stage = ?, accuracy_status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(mentions_24h)
    .bind(maturity_stage.as_str())
    .bind(accuracy_status.as_str())
    .bind(Utc::now())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite only the live mention count (mention-attach path)
pub async fn update_mention_count(pool: &SqlitePool, id: Uuid, mentions_24h: i64) -> Result<()> {
    sqlx::query("UPDATE trends SET mentions_24h = ?, updated_at = ? WHERE id = ?")
        .bind(mentions_24h)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a trend; mentions, edges and history cascade
pub async fn delete_trend(pool: &SqlitePool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM trends WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Case-insensitive substring search over title and description
pub async fn search(pool: &SqlitePool, query: &str, limit: i64) -> Result<Vec<Trend>> {
    let pattern = format!("%{}%", query);
    let rows = sqlx::query(&format!(
        "SELECT {} FROM trends
         WHERE title LIKE ? COLLATE NOCASE OR description LIKE ? COLLATE NOCASE
         ORDER BY mentions_24h DESC
         LIMIT ?",
        TREND_COLUMNS
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(trend_from_row).collect()
}

/// Trends still on the upswing, ordered by current mention volume
pub async fn trending_now(pool: &SqlitePool, limit: i64) -> Result<Vec<Trend>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM trends
         WHERE maturity_stage IN ('DISCOVERY', 'POLAR_TREND', 'EARLY_MAINSTREAM')
         ORDER BY mentions_24h DESC, created_at DESC
         LIMIT ?",
        TREND_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(trend_from_row).collect()
}

/// Trends first detected within the half-open window [start, end), newest first
pub async fn detected_between(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Trend>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM trends
         WHERE first_detected_at >= ? AND first_detected_at < ?
         ORDER BY created_at DESC",
        TREND_COLUMNS
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    rows.iter().map(trend_from_row).collect()
}

/// Total trend count
pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trends")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Trend counts grouped by maturity stage
pub async fn count_by_stage(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT maturity_stage, COUNT(*) FROM trends GROUP BY maturity_stage",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Trend counts grouped by accuracy status
pub async fn count_by_status(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT accuracy_status, COUNT(*) FROM trends GROUP BY accuracy_status",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
