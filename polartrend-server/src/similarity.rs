//! Similarity graph engine
//!
//! Orchestrates trend reads and the pure similarity scoring into the
//! `similar_trends` edge table. Edges exist only where the combined score is
//! strictly above [`SIMILARITY_THRESHOLD`], and are always written as a
//! symmetric pair of directed rows with equal scores.
//!
//! `rebuild_for_trend` on its own never removes edges; a score that drops to
//! or below the threshold leaves its old edge in place. Callers that need a
//! consistent rebuild (the update path) call `clear_for_trend` first.
//! `rebuild_all` clears the whole table and is therefore idempotent.

use crate::db::{similar, trends};
use anyhow::Result;
use polartrend_common::db::models::Trend;
use polartrend_common::similarity::{score_pair, SIMILARITY_THRESHOLD};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of a full graph rebuild, for admin reporting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildSummary {
    pub total_trends: i64,
    pub total_relationships: i64,
}

/// Similarity graph engine over the shared connection pool
#[derive(Clone)]
pub struct SimilarityEngine {
    db: SqlitePool,
}

impl SimilarityEngine {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Recompute edges between one trend and every other trend
    ///
    /// Upserts both directed edges for every pair scoring above the
    /// threshold. A failed upsert for one pair is logged and skipped; the
    /// remaining pairs are still processed. Returns the number of trends
    /// linked.
    pub async fn rebuild_for_trend(&self, trend_id: Uuid) -> Result<usize> {
        let Some(current) = trends::get_trend(&self.db, trend_id).await? else {
            debug!(%trend_id, "Similarity rebuild skipped: trend not found");
            return Ok(0);
        };

        let others: Vec<Trend> = trends::list_all(&self.db)
            .await?
            .into_iter()
            .filter(|t| t.id != trend_id)
            .collect();

        debug!(title = %current.title, candidates = others.len(), "Scoring similar trends");

        let mut linked = 0usize;
        for other in &others {
            let score = score_pair(
                &current.title,
                current.description.as_deref(),
                &other.title,
                other.description.as_deref(),
            );

            if score <= SIMILARITY_THRESHOLD {
                continue;
            }

            // Symmetric pair; per-pair failures must not abort the pass
            let forward = similar::upsert_edge(&self.db, current.id, other.id, score).await;
            let reverse = similar::upsert_edge(&self.db, other.id, current.id, score).await;

            match (forward, reverse) {
                (Ok(()), Ok(())) => {
                    linked += 1;
                    debug!(
                        from = %current.title,
                        to = %other.title,
                        score = format!("{:.3}", score),
                        "Linked similar trends"
                    );
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!(
                        from = %current.id,
                        to = %other.id,
                        error = %e,
                        "Failed to upsert similarity edge, continuing"
                    );
                }
            }
        }

        Ok(linked)
    }

    /// Delete all edges touching a trend (either direction)
    ///
    /// The update path runs this before `rebuild_for_trend` so edges whose
    /// score fell below the threshold disappear.
    pub async fn clear_for_trend(&self, trend_id: Uuid) -> Result<u64> {
        similar::delete_touching(&self.db, trend_id).await
    }

    /// Drop the entire edge table and rebuild it from every trend
    pub async fn rebuild_all(&self) -> Result<RebuildSummary> {
        info!("Rebuilding all similar trend relationships");

        similar::delete_all(&self.db).await?;

        let all_trends = trends::list_all(&self.db).await?;
        for trend in &all_trends {
            self.rebuild_for_trend(trend.id).await?;
        }

        let total_relationships = similar::count_total(&self.db).await?;
        info!(
            trends = all_trends.len(),
            relationships = total_relationships,
            "Similarity graph rebuilt"
        );

        Ok(RebuildSummary {
            total_trends: all_trends.len() as i64,
            total_relationships,
        })
    }

    /// Fire-and-forget rebuild for one trend
    ///
    /// Callers observe eventual consistency of the edge set; failures are
    /// logged and never surfaced to the triggering request.
    pub fn spawn_rebuild(&self, trend_id: Uuid) {
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.rebuild_for_trend(trend_id).await {
                error!(%trend_id, error = %e, "Background similarity rebuild failed");
            }
        });
    }
}
