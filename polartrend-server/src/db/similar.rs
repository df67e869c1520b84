//! Similarity edge persistence
//!
//! Edges are directed rows but always written as symmetric pairs by the
//! similarity engine; the upsert is idempotent per directed pair.

use anyhow::Result;
use chrono::Utc;
use polartrend_common::db::models::SimilarTrendEdge;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert or refresh one directed edge
pub async fn upsert_edge(pool: &SqlitePool, from: Uuid, to: Uuid, score: f64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO similar_trends (from_trend_id, to_trend_id, similarity_score, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(from_trend_id, to_trend_id) DO UPDATE SET
            similarity_score = excluded.similarity_score,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(from.to_string())
    .bind(to.to_string())
    .bind(score)
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete every edge in the graph
pub async fn delete_all(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM similar_trends").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Delete every edge where the trend is source or target
pub async fn delete_touching(pool: &SqlitePool, trend_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM similar_trends WHERE from_trend_id = ? OR to_trend_id = ?",
    )
    .bind(trend_id.to_string())
    .bind(trend_id.to_string())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Outgoing edges for a trend, highest score first
pub async fn list_from(pool: &SqlitePool, trend_id: Uuid, limit: i64) -> Result<Vec<SimilarTrendEdge>> {
    let rows = sqlx::query(
        "SELECT from_trend_id, to_trend_id, similarity_score
         FROM similar_trends
         WHERE from_trend_id = ?
         ORDER BY similarity_score DESC
         LIMIT ?",
    )
    .bind(trend_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let from: String = row.get("from_trend_id");
            let to: String = row.get("to_trend_id");
            Ok(SimilarTrendEdge {
                from_trend_id: Uuid::parse_str(&from)?,
                to_trend_id: Uuid::parse_str(&to)?,
                similarity_score: row.get("similarity_score"),
            })
        })
        .collect()
}

/// Score of one directed edge, if present
pub async fn get_edge_score(pool: &SqlitePool, from: Uuid, to: Uuid) -> Result<Option<f64>> {
    let score: Option<f64> = sqlx::query_scalar(
        "SELECT similarity_score FROM similar_trends WHERE from_trend_id = ? AND to_trend_id = ?",
    )
    .bind(from.to_string())
    .bind(to.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(score)
}

/// Total directed edge count
pub async fn count_total(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM similar_trends")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
