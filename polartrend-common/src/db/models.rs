//! Database models

use crate::classify::{AccuracyStatus, MaturityStage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked keyword-driven topic with lifecycle classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub mentions_24h: i64,
    pub historical_count: i64,
    pub maturity_stage: MaturityStage,
    pub accuracy_status: AccuracyStatus,
    pub first_detected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single observed occurrence of a trend in Reddit content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditMention {
    pub id: Uuid,
    pub trend_id: Uuid,
    pub subreddit: String,
    pub post_title: String,
    pub post_url: String,
    pub mentioned_at: DateTime<Utc>,
}

/// A staged mention awaiting promotion into a trend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMention {
    pub id: Uuid,
    pub candidate: String,
    pub subreddit: String,
    pub post_title: String,
    pub post_url: String,
    pub mentioned_at: DateTime<Utc>,
}

/// A directed, scored similarity edge between two trends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarTrendEdge {
    pub from_trend_id: Uuid,
    pub to_trend_id: Uuid,
    pub similarity_score: f64,
}

/// Immutable audit snapshot of a trend's classification at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSnapshot {
    pub id: Uuid,
    pub trend_id: Uuid,
    pub snapshot_date: DateTime<Utc>,
    pub mentions_24h: i64,
    pub maturity_stage: MaturityStage,
    pub accuracy_status: AccuracyStatus,
}

/// Registered user (password fields never serialized)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
