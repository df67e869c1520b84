//! polartrend-server library - Reddit trend tracking service
//!
//! Polls Reddit for keyword mentions, aggregates them into trend records
//! with maturity/accuracy classifications and a Jaccard-based similarity
//! graph, and serves a JSON API for discovery and CRUD.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub mod api;
pub mod db;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod pagination;
pub mod service;
pub mod similarity;

use similarity::SimilarityEngine;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Similarity graph engine (spawns detached rebuilds)
    pub engine: SimilarityEngine,
    /// Secret for signing session tokens
    pub session_secret: i64,
    /// Service start time for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, session_secret: i64) -> Self {
        let engine = SimilarityEngine::new(db.clone());
        Self {
            db,
            engine,
            session_secret,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// Health, auth, registration, and trend discovery/CRUD are public; user
/// profile routes and the admin rebuild require a session cookie.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, patch, post, put};

    // Admin-only graph rebuild carries the session middleware on its own
    let rebuild_route = Router::new()
        .route(
            "/rebuild-similar",
            post(api::trends::rebuild_all_similar_trends),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    let trend_routes = Router::new()
        .merge(rebuild_route)
        .route("/stats", get(api::trends::get_stats))
        .route("/trending", get(api::trends::get_trending))
        .route("/search", get(api::trends::search_trends))
        .route(
            "/fast-forward/month",
            get(api::trends::get_trends_one_month_ago),
        )
        .route("/", get(api::trends::get_trends_with_filters))
        .route("/", post(api::trends::create_trend))
        .route("/:id", get(api::trends::get_single_trend))
        .route("/:id", put(api::trends::update_trend))
        .route("/:id", delete(api::trends::delete_trend))
        .route("/:id/similar", get(api::trends::get_similar_trends))
        .route("/:id/mentions", post(api::trends::add_reddit_mentions));

    let auth_routes = Router::new()
        .route("/login", post(api::auth::login))
        .route("/logout", post(api::auth::logout));

    // Session-protected routes
    let protected = Router::new()
        .route("/users/me", get(api::users::get_me))
        .route("/users", get(api::users::get_all_users))
        .route("/users/profile", patch(api::users::update_profile))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::auth_middleware,
        ));

    let api_v1 = Router::new()
        .nest("/trends", trend_routes)
        .nest("/auth", auth_routes)
        .route("/users/register", post(api::users::create_user))
        .merge(protected);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(api::health::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
