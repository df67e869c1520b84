//! Trend history snapshots (immutable audit trail)

use anyhow::{anyhow, Result};
use chrono::Utc;
use polartrend_common::classify::{AccuracyStatus, MaturityStage};
use polartrend_common::db::models::TrendSnapshot;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn snapshot_from_row(row: &SqliteRow) -> Result<TrendSnapshot> {
    let id: String = row.get("id");
    let trend_id: String = row.get("trend_id");
    let stage: String = row.get("maturity_stage");
    let status: String = row.get("accuracy_status");

    Ok(TrendSnapshot {
        id: Uuid::parse_str(&id)?,
        trend_id: Uuid::parse_str(&trend_id)?,
        snapshot_date: row.get("snapshot_date"),
        mentions_24h: row.get("mentions_24h"),
        maturity_stage: stage.parse::<MaturityStage>().map_err(|e| anyhow!(e))?,
        accuracy_status: status.parse::<AccuracyStatus>().map_err(|e| anyhow!(e))?,
    })
}

/// Append a snapshot row
pub async fn insert_snapshot(pool: &SqlitePool, snapshot: &TrendSnapshot) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO trend_history (
            id, trend_id, snapshot_date, mentions_24h, maturity_stage, accuracy_status, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(snapshot.id.to_string())
    .bind(snapshot.trend_id.to_string())
    .bind(snapshot.snapshot_date)
    .bind(snapshot.mentions_24h)
    .bind(snapshot.maturity_stage.as_str())
    .bind(snapshot.accuracy_status.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Latest snapshots for a trend, newest first
pub async fn latest_for_trend(
    pool: &SqlitePool,
    trend_id: Uuid,
    limit: i64,
) -> Result<Vec<TrendSnapshot>> {
    let rows = sqlx::query(
        "SELECT id, trend_id, snapshot_date, mentions_24h, maturity_stage, accuracy_status
         FROM trend_history
         WHERE trend_id = ?
         ORDER BY snapshot_date DESC
         LIMIT ?",
    )
    .bind(trend_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(snapshot_from_row).collect()
}

/// Most recent snapshot for a trend, if any
pub async fn latest_one(pool: &SqlitePool, trend_id: Uuid) -> Result<Option<TrendSnapshot>> {
    Ok(latest_for_trend(pool, trend_id, 1).await?.into_iter().next())
}
