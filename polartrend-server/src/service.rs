//! Trend lifecycle orchestration
//!
//! Shared by the HTTP handlers and the ingestion poller: creation and
//! update both derive classifications here and trigger detached similarity
//! rebuilds.

use crate::db::{mentions, trends};
use crate::similarity::SimilarityEngine;
use anyhow::Result;
use chrono::Utc;
use polartrend_common::classify::{accuracy_status, maturity_stage};
use polartrend_common::db::models::{RedditMention, Trend};
use polartrend_common::slug::slugify;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Input for trend creation
#[derive(Debug, Clone)]
pub struct NewTrend {
    pub title: String,
    pub mentions_24h: i64,
    pub description: Option<String>,
}

/// Input for trend update; None leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct TrendChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub mentions_24h: Option<i64>,
}

/// Create a trend and trigger similarity detection in the background
///
/// Accuracy is computed at day 0 and is therefore always TOO_EARLY at
/// creation regardless of the initial mention count.
pub async fn create_trend(
    pool: &SqlitePool,
    engine: &SimilarityEngine,
    input: NewTrend,
) -> Result<Trend> {
    let now = Utc::now();
    let trend = Trend {
        id: Uuid::new_v4(),
        slug: slugify(&input.title),
        maturity_stage: maturity_stage(input.mentions_24h),
        accuracy_status: accuracy_status(0, input.mentions_24h),
        title: input.title,
        description: input.description,
        mentions_24h: input.mentions_24h,
        historical_count: 0,
        first_detected_at: now,
        created_at: now,
        updated_at: now,
    };

    trends::insert_trend(pool, &trend).await?;
    info!(title = %trend.title, stage = %trend.maturity_stage, "Trend created");

    // Does not block the caller; the edge set converges eventually
    engine.spawn_rebuild(trend.id);

    Ok(trend)
}

/// Apply changes to a trend, reclassify, and refresh its similarity edges
/// when the text changed
pub async fn update_trend(
    pool: &SqlitePool,
    engine: &SimilarityEngine,
    trend_id: Uuid,
    changes: TrendChanges,
) -> Result<Option<Trend>> {
    let Some(existing) = trends::get_trend(pool, trend_id).await? else {
        return Ok(None);
    };

    let text_changed = changes.title.is_some() || changes.description.is_some();

    let mentions = changes.mentions_24h.unwrap_or(existing.mentions_24h);
    let days_since_detected = (Utc::now() - existing.first_detected_at).num_days();

    let mut updated = existing;
    if let Some(title) = changes.title {
        updated.slug = slugify(&title);
        updated.title = title;
    }
    if let Some(description) = changes.description {
        updated.description = Some(description);
    }
    updated.mentions_24h = mentions;
    updated.maturity_stage = maturity_stage(mentions);
    updated.accuracy_status = accuracy_status(days_since_detected, mentions);
    updated.updated_at = Utc::now();

    trends::update_trend(pool, &updated).await?;

    if text_changed {
        info!(trend_id = %trend_id, "Title/description changed, recalculating similar trends");
        engine.clear_for_trend(trend_id).await?;
        engine.spawn_rebuild(trend_id);
    }

    Ok(Some(updated))
}

/// Attach mention records to a trend and refresh its live mention count
///
/// Returns the number of newly inserted mentions (duplicates by post URL
/// are skipped).
pub async fn attach_mentions(
    pool: &SqlitePool,
    trend_id: Uuid,
    new_mentions: Vec<RedditMention>,
) -> Result<usize> {
    let mut inserted = 0usize;
    for mention in &new_mentions {
        if mentions::insert_mention(pool, mention).await? {
            inserted += 1;
        }
    }

    let total = mentions::count_for_trend(pool, trend_id).await?;
    trends::update_mention_count(pool, trend_id, total).await?;

    Ok(inserted)
}
