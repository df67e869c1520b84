//! Periodic reclassification and history snapshot job
//!
//! On each tick every trend gets its trailing-24h mention count recomputed,
//! its maturity and accuracy re-derived, an immutable history row appended,
//! and its live fields overwritten.

use crate::db::{history, mentions, settings, trends};
use anyhow::Result;
use chrono::{Duration, Utc};
use polartrend_common::classify::{accuracy_status, maturity_stage};
use polartrend_common::db::models::TrendSnapshot;
use sqlx::SqlitePool;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Periodic trend reclassification job
pub struct SnapshotJob {
    db: SqlitePool,
}

impl SnapshotJob {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Run forever; interval is read from settings each tick
    pub async fn run(self) {
        loop {
            let interval_secs = settings::get_i64(&self.db, "snapshot_interval_secs", 60)
                .await
                .max(1);
            tokio::time::sleep(std::time::Duration::from_secs(interval_secs as u64)).await;

            match self.snapshot_all().await {
                Ok(count) => {
                    if count > 0 {
                        info!(trends = count, "Trend snapshots recorded");
                    }
                }
                Err(e) => error!(error = %e, "Snapshot tick failed"),
            }
        }
    }

    /// Reclassify and snapshot every trend; returns the number processed
    pub async fn snapshot_all(&self) -> Result<usize> {
        let now = Utc::now();
        let window_start = now - Duration::hours(24);
        let all = trends::list_all(&self.db).await?;
        let mut processed = 0usize;

        for trend in &all {
            let recent = mentions::count_recent(&self.db, trend.id, window_start).await?;
            let days = (now - trend.first_detected_at).num_days();
            let stage = maturity_stage(recent);
            let status = accuracy_status(days, recent);

            let snapshot = TrendSnapshot {
                id: Uuid::new_v4(),
                trend_id: trend.id,
                snapshot_date: now,
                mentions_24h: recent,
                maturity_stage: stage,
                accuracy_status: status,
            };
            history::insert_snapshot(&self.db, &snapshot).await?;
            trends::update_live_fields(&self.db, trend.id, recent, stage, status).await?;

            debug!(
                title = %trend.title,
                mentions = recent,
                stage = %stage,
                status = %status,
                "Trend reclassified"
            );
            processed += 1;
        }

        Ok(processed)
    }
}
