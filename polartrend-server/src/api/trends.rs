//! Trend endpoints: discovery, CRUD, mentions, similarity

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Duration, Months, Utc};
use polartrend_common::auth::SessionClaims;
use polartrend_common::classify::{AccuracyStatus, MaturityStage};
use polartrend_common::db::models::{RedditMention, Trend, TrendSnapshot};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::{auth::require_admin, ApiResponse, PageMeta};
use crate::db::{history, mentions, similar, trends};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, DEFAULT_PAGE_SIZE};
use crate::service::{self, NewTrend, TrendChanges};
use crate::AppState;

fn parse_trend_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("Invalid trend id: {}", id)))
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Aggregate counts for the dashboard
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStats {
    pub total_trends: i64,
    pub total_mentions: i64,
    pub total_relationships: i64,
    pub by_maturity_stage: Vec<StageCount>,
    pub by_accuracy_status: Vec<StageCount>,
}

#[derive(Debug, Serialize)]
pub struct StageCount {
    pub name: String,
    pub count: i64,
}

/// GET /api/v1/trends/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<TrendStats>>> {
    let stats = TrendStats {
        total_trends: trends::count_all(&state.db).await?,
        total_mentions: mentions::count_total(&state.db).await?,
        total_relationships: similar::count_total(&state.db).await?,
        by_maturity_stage: trends::count_by_stage(&state.db)
            .await?
            .into_iter()
            .map(|(name, count)| StageCount { name, count })
            .collect(),
        by_accuracy_status: trends::count_by_status(&state.db)
            .await?
            .into_iter()
            .map(|(name, count)| StageCount { name, count })
            .collect(),
    };

    Ok(Json(ApiResponse::ok(
        "Trend stats retrieved successfully",
        stats,
    )))
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/trends/trending
///
/// Active stages only (saturated trends are excluded), busiest first.
pub async fn get_trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Trend>>>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let result = trends::trending_now(&state.db, limit).await?;

    Ok(Json(ApiResponse::ok(
        "Trending trends retrieved successfully",
        result,
    )))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/v1/trends/search?q=
pub async fn search_trends(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Trend>>>> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Search query is required".to_string()))?;

    let result = trends::search(&state.db, q, 20).await?;

    Ok(Json(ApiResponse::ok(
        "Search results retrieved successfully",
        result,
    )))
}

/// Then-vs-now comparison between a trend's stored fields and its latest
/// snapshot. Falls back to the stored fields when no snapshot exists yet.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendComparison {
    pub initial_mentions: i64,
    pub current_mentions: i64,
    pub initial_stage: MaturityStage,
    pub current_stage: MaturityStage,
    pub initial_accuracy: AccuracyStatus,
    pub current_accuracy: AccuracyStatus,
    /// Percentage growth, one decimal, e.g. "150.0%"
    pub growth: String,
}

/// A month-old trend with its proof, latest snapshot, and comparison block
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOldTrend {
    #[serde(flatten)]
    pub trend: Trend,
    pub reddit_mentions: Vec<RedditMention>,
    pub latest_snapshot: Option<TrendSnapshot>,
    pub comparison: TrendComparison,
}

fn compare_with_snapshot(trend: &Trend, snapshot: Option<&TrendSnapshot>) -> TrendComparison {
    let growth = match snapshot {
        Some(s) if trend.mentions_24h > 0 => {
            let delta = (s.mentions_24h - trend.mentions_24h) as f64;
            format!("{:.1}%", delta / trend.mentions_24h as f64 * 100.0)
        }
        _ => "0%".to_string(),
    };

    TrendComparison {
        initial_mentions: trend.mentions_24h,
        current_mentions: snapshot.map(|s| s.mentions_24h).unwrap_or(trend.mentions_24h),
        initial_stage: trend.maturity_stage,
        current_stage: snapshot
            .map(|s| s.maturity_stage)
            .unwrap_or(trend.maturity_stage),
        initial_accuracy: trend.accuracy_status,
        current_accuracy: snapshot
            .map(|s| s.accuracy_status)
            .unwrap_or(trend.accuracy_status),
        growth,
    }
}

/// GET /api/v1/trends/fast-forward/month
///
/// Trends first detected on the calendar day one calendar month ago
/// (day-of-month clamped at month end), each with its 5 latest mentions
/// and a then-vs-now comparison against the latest snapshot.
pub async fn get_trends_one_month_ago(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<MonthOldTrend>>>> {
    let day = Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(1))
        .ok_or_else(|| ApiError::Internal("Invalid date arithmetic".to_string()))?;
    let start = day
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| ApiError::Internal("Invalid date arithmetic".to_string()))?;
    let end = start + Duration::days(1);

    let month_old = trends::detected_between(&state.db, start, end).await?;

    let mut result = Vec::with_capacity(month_old.len());
    for trend in month_old {
        let reddit_mentions = mentions::latest_for_trend(&state.db, trend.id, 5).await?;
        let latest_snapshot = history::latest_one(&state.db, trend.id).await?;
        let comparison = compare_with_snapshot(&trend, latest_snapshot.as_ref());
        result.push(MonthOldTrend {
            trend,
            reddit_mentions,
            latest_snapshot,
            comparison,
        });
    }

    Ok(Json(ApiResponse::ok(
        "1-month-old trends retrieved successfully",
        result,
    )))
}

// ---------------------------------------------------------------------------
// Listing and detail
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub maturity_stage: Option<String>,
    pub accuracy_status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/v1/trends
///
/// Optional classification filters plus page/limit pagination.
pub async fn get_trends_with_filters(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Trend>>>> {
    let stage = query
        .maturity_stage
        .as_deref()
        .map(|s| {
            s.parse::<MaturityStage>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid maturity stage: {}", s)))
        })
        .transpose()?;
    let status = query
        .accuracy_status
        .as_deref()
        .map(|s| {
            s.parse::<AccuracyStatus>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid accuracy status: {}", s)))
        })
        .transpose()?;

    let total = trends::count_filtered(&state.db, stage, status).await?;
    let pagination = calculate_pagination(
        total,
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    );

    let result = trends::list_filtered(
        &state.db,
        stage,
        status,
        pagination.limit,
        pagination.offset,
    )
    .await?;

    Ok(Json(ApiResponse::ok_paginated(
        "Trends retrieved successfully",
        result,
        PageMeta {
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages: pagination.total_pages,
        },
    )))
}

/// A similar trend together with its edge score
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarTrend {
    #[serde(flatten)]
    pub trend: Trend,
    pub similarity_score: f64,
}

/// Full trend detail: recent proof, classification history, neighbors
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDetail {
    #[serde(flatten)]
    pub trend: Trend,
    pub reddit_mentions: Vec<RedditMention>,
    pub history: Vec<TrendSnapshot>,
    pub similar_trends: Vec<SimilarTrend>,
}

async fn load_similar(
    state: &AppState,
    trend_id: Uuid,
    limit: i64,
) -> ApiResult<Vec<SimilarTrend>> {
    let edges = similar::list_from(&state.db, trend_id, limit).await?;
    let mut result = Vec::with_capacity(edges.len());
    for edge in edges {
        // Target may have been deleted since the edge was written
        if let Some(trend) = trends::get_trend(&state.db, edge.to_trend_id).await? {
            result.push(SimilarTrend {
                trend,
                similarity_score: edge.similarity_score,
            });
        }
    }
    Ok(result)
}

/// GET /api/v1/trends/:id
pub async fn get_single_trend(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<TrendDetail>>> {
    let id = parse_trend_id(&id)?;
    let trend = trends::get_trend(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Trend not found".to_string()))?;

    let detail = TrendDetail {
        reddit_mentions: mentions::latest_for_trend(&state.db, id, 10).await?,
        history: history::latest_for_trend(&state.db, id, 30).await?,
        similar_trends: load_similar(&state, id, 5).await?,
        trend,
    };

    Ok(Json(ApiResponse::ok(
        "Trend retrieved successfully",
        detail,
    )))
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/trends/:id/similar
pub async fn get_similar_trends(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SimilarQuery>,
) -> ApiResult<Json<ApiResponse<Vec<SimilarTrend>>>> {
    let id = parse_trend_id(&id)?;
    if trends::get_trend(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Trend not found".to_string()));
    }

    let limit = query.limit.unwrap_or(5).clamp(1, 100);
    let result = load_similar(&state, id, limit).await?;

    Ok(Json(ApiResponse::ok(
        "Similar trends retrieved successfully",
        result,
    )))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrendRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub mentions_24h: Option<i64>,
}

/// POST /api/v1/trends
///
/// Validation failures are aggregated into a single 400 message.
pub async fn create_trend(
    State(state): State<AppState>,
    Json(body): Json<CreateTrendRequest>,
) -> ApiResult<Response> {
    let mut problems = Vec::new();

    let title = body.title.as_deref().map(str::trim).unwrap_or("");
    if title.is_empty() {
        problems.push("Title is required");
    }
    let mentions_24h = body.mentions_24h.unwrap_or(0);
    if mentions_24h < 0 {
        problems.push("Mention count must not be negative");
    }

    if !problems.is_empty() {
        return Err(ApiError::BadRequest(problems.join("; ")));
    }

    if trends::get_trend_by_title(&state.db, title).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Trend already exists: {}",
            title
        )));
    }

    let trend = service::create_trend(
        &state.db,
        &state.engine,
        NewTrend {
            title: title.to_string(),
            mentions_24h,
            description: body.description.clone(),
        },
    )
    .await?;

    let body = Json(ApiResponse::ok("Trend created successfully", trend));
    Ok((StatusCode::CREATED, body).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrendRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub mentions_24h: Option<i64>,
}

/// PUT /api/v1/trends/:id
pub async fn update_trend(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateTrendRequest>,
) -> ApiResult<Json<ApiResponse<Trend>>> {
    let id = parse_trend_id(&id)?;

    if let Some(title) = body.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("Title must not be empty".to_string()));
        }
    }
    if matches!(body.mentions_24h, Some(n) if n < 0) {
        return Err(ApiError::BadRequest(
            "Mention count must not be negative".to_string(),
        ));
    }

    let updated = service::update_trend(
        &state.db,
        &state.engine,
        id,
        TrendChanges {
            title: body.title.clone(),
            description: body.description.clone(),
            mentions_24h: body.mentions_24h,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Trend not found".to_string()))?;

    Ok(Json(ApiResponse::ok("Trend updated successfully", updated)))
}

/// DELETE /api/v1/trends/:id
///
/// Mentions, history, and similarity edges cascade with the trend row.
pub async fn delete_trend(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_trend_id(&id)?;
    let deleted = trends::delete_trend(&state.db, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Trend not found".to_string()));
    }

    info!(trend_id = %id, "Trend deleted");
    Ok(Json(ApiResponse::ok("Trend deleted successfully", ())))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionInput {
    pub subreddit: String,
    pub post_title: String,
    pub post_url: String,
    pub mentioned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AddMentionsRequest {
    pub mentions: Vec<MentionInput>,
}

/// POST /api/v1/trends/:id/mentions
///
/// Bulk attach; already-recorded URLs are skipped. Responds with the number
/// of newly attached mentions.
pub async fn add_reddit_mentions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddMentionsRequest>,
) -> ApiResult<Response> {
    let id = parse_trend_id(&id)?;
    if trends::get_trend(&state.db, id).await?.is_none() {
        return Err(ApiError::NotFound("Trend not found".to_string()));
    }
    if body.mentions.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one mention is required".to_string(),
        ));
    }

    let records: Vec<RedditMention> = body
        .mentions
        .into_iter()
        .map(|m| RedditMention {
            id: Uuid::new_v4(),
            trend_id: id,
            subreddit: m.subreddit,
            post_title: m.post_title,
            post_url: m.post_url,
            mentioned_at: m.mentioned_at.unwrap_or_else(Utc::now),
        })
        .collect();

    let added = service::attach_mentions(&state.db, id, records).await?;

    let body = Json(ApiResponse::ok(
        "Reddit mentions added successfully",
        serde_json::json!({ "added": added }),
    ));
    Ok((StatusCode::CREATED, body).into_response())
}

/// Result of a full similarity graph rebuild
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildResponse {
    pub total_trends: i64,
    pub total_relationships: i64,
}

/// POST /api/v1/trends/rebuild-similar (admin only)
pub async fn rebuild_all_similar_trends(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> ApiResult<Json<ApiResponse<RebuildResponse>>> {
    require_admin(&claims)?;

    let summary = state.engine.rebuild_all().await?;

    Ok(Json(ApiResponse::ok(
        "Similar trends rebuilt successfully",
        RebuildResponse {
            total_trends: summary.total_trends,
            total_relationships: summary.total_relationships,
        },
    )))
}
