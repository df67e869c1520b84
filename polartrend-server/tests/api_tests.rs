//! Integration tests for the polartrend HTTP API
//!
//! Each test drives the full router with `tower::ServiceExt::oneshot`
//! against its own in-memory database, covering the response envelope,
//! trend CRUD and discovery, pagination, and the session cookie guards.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{Months, Utc};
use polartrend_common::auth::{generate_salt, hash_password, issue_token, SessionClaims};
use polartrend_common::classify::{AccuracyStatus, MaturityStage};
use polartrend_common::db::init::init_in_memory;
use polartrend_common::db::models::{TrendSnapshot, User};
use polartrend_server::{build_router, db, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

const TEST_SECRET: i64 = 42;

/// Test helper: fresh in-memory database + router
async fn setup_app() -> (axum::Router, SqlitePool) {
    let pool = init_in_memory().await.expect("Should open in-memory db");
    let state = AppState::new(pool.clone(), TEST_SECRET);
    (build_router(state), pool)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_session(mut request: Request<Body>, user_id: Uuid, role: &str) -> Request<Body> {
    let token = issue_token(
        &SessionClaims {
            user_id,
            role: role.to_string(),
            expires_at: Utc::now().timestamp_millis() + 60_000,
        },
        TEST_SECRET,
    );
    request.headers_mut().insert(
        header::COOKIE,
        format!("accessToken={}", token).parse().unwrap(),
    );
    request
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn insert_test_user(pool: &SqlitePool, email: &str, password: &str, role: &str) -> Uuid {
    let salt = generate_salt();
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: None,
        password_hash: hash_password(password, &salt),
        password_salt: salt,
        role: role.to_string(),
        created_at: now,
        updated_at: now,
    };
    db::users::insert_user(pool, &user)
        .await
        .expect("Should insert user");
    user.id
}

/// Create a trend through the API and return its JSON representation
async fn create_trend(app: &axum::Router, title: &str, mentions: i64) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/trends",
            json!({ "title": title, "mentions24h": mentions }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await["data"].clone()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (app, _pool) = setup_app().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "polartrend-server");
    assert!(body["version"].is_string());
}

// =============================================================================
// Trend CRUD
// =============================================================================

#[tokio::test]
async fn test_create_trend_classifies_and_slugs() {
    let (app, _pool) = setup_app().await;

    let data = create_trend(&app, "Local LLM Inference", 45).await;

    assert_eq!(data["title"], "Local LLM Inference");
    assert_eq!(data["slug"], "local-llm-inference");
    assert_eq!(data["maturityStage"], "POLAR_TREND");
    // Day zero: always TOO_EARLY regardless of mention count
    assert_eq!(data["accuracyStatus"], "TOO_EARLY");
    assert_eq!(data["mentions24h"], 45);
}

#[tokio::test]
async fn test_create_trend_validation_aggregates_problems() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/trends",
            json!({ "title": "  ", "mentions24h": -3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Title is required"));
    assert!(message.contains("Mention count must not be negative"));
}

#[tokio::test]
async fn test_create_duplicate_title_conflicts() {
    let (app, _pool) = setup_app().await;

    create_trend(&app, "Edge AI", 5).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/trends",
            json!({ "title": "Edge AI", "mentions24h": 9 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_single_trend_includes_detail_sections() {
    let (app, _pool) = setup_app().await;

    let data = create_trend(&app, "Self Host Everything", 10).await;
    let id = data["id"].as_str().unwrap();

    let response = app
        .oneshot(get(&format!("/api/v1/trends/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Self Host Everything");
    assert!(body["data"]["redditMentions"].as_array().unwrap().is_empty());
    assert!(body["data"]["history"].as_array().unwrap().is_empty());
    assert!(body["data"]["similarTrends"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_trend_is_404() {
    let (app, _pool) = setup_app().await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/trends/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());

    // Malformed id answers 400, not 404
    let response = app
        .oneshot(get("/api/v1/trends/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_trend_reclassifies_maturity() {
    let (app, _pool) = setup_app().await;

    let data = create_trend(&app, "Agent Frameworks", 10).await;
    assert_eq!(data["maturityStage"], "DISCOVERY");
    let id = data["id"].as_str().unwrap();

    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/trends/{}", id),
            json!({ "mentions24h": 150 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["mentions24h"], 150);
    assert_eq!(body["data"]["maturityStage"], "EARLY_MAINSTREAM");
}

#[tokio::test]
async fn test_delete_trend_then_404() {
    let (app, _pool) = setup_app().await;

    let data = create_trend(&app, "Ephemeral", 1).await;
    let id = data["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/trends/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/api/v1/trends/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Mentions
// =============================================================================

#[tokio::test]
async fn test_add_mentions_dedups_by_url_and_refreshes_count() {
    let (app, _pool) = setup_app().await;

    let data = create_trend(&app, "RAG Pipelines", 0).await;
    let id = data["id"].as_str().unwrap();

    let mentions = json!({
        "mentions": [
            {
                "subreddit": "LocalLLaMA",
                "postTitle": "My rag setup",
                "postUrl": "https://www.reddit.com/r/LocalLLaMA/comments/abc"
            },
            {
                "subreddit": "LocalLLaMA",
                "postTitle": "My rag setup",
                "postUrl": "https://www.reddit.com/r/LocalLLaMA/comments/abc"
            },
            {
                "subreddit": "OpenAI",
                "postTitle": "rag vs fine tuning",
                "postUrl": "https://www.reddit.com/r/OpenAI/comments/def"
            }
        ]
    });

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/trends/{}/mentions", id),
            mentions,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    // Duplicate URL within the batch is skipped
    assert_eq!(body["data"]["added"], 2);

    let response = app
        .oneshot(get(&format!("/api/v1/trends/{}", id)))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["mentions24h"], 2);
    assert_eq!(body["data"]["redditMentions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_mentions_requires_nonempty_batch() {
    let (app, _pool) = setup_app().await;

    let data = create_trend(&app, "Privacy Tools", 0).await;
    let id = data["id"].as_str().unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/trends/{}/mentions", id),
            json!({ "mentions": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Discovery
// =============================================================================

#[tokio::test]
async fn test_list_trends_paginated_with_meta() {
    let (app, _pool) = setup_app().await;

    for i in 0..3 {
        create_trend(&app, &format!("Trend {}", i), i).await;
    }

    let response = app
        .oneshot(get("/api/v1/trends?page=1&limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["limit"], 2);
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["totalPages"], 2);
}

#[tokio::test]
async fn test_list_trends_filter_by_stage() {
    let (app, _pool) = setup_app().await;

    create_trend(&app, "Small", 5).await;
    create_trend(&app, "Big", 500).await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/trends?maturityStage=SATURATION"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "Big");

    // Unknown stage value answers 400
    let response = app
        .oneshot(get("/api/v1/trends?maturityStage=MEGA"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_requires_query() {
    let (app, _pool) = setup_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/v1/trends/search"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    create_trend(&app, "Offline inference on phones", 3).await;
    let response = app
        .oneshot(get("/api/v1/trends/search?q=inference"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_trending_excludes_saturated_trends() {
    let (app, _pool) = setup_app().await;

    create_trend(&app, "Saturated", 900).await;
    create_trend(&app, "Growing", 50).await;

    let response = app.oneshot(get("/api/v1/trends/trending")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["title"], "Growing");
}

#[tokio::test]
async fn test_stats_counts() {
    let (app, _pool) = setup_app().await;

    create_trend(&app, "One", 5).await;
    create_trend(&app, "Two", 100).await;

    let response = app.oneshot(get("/api/v1/trends/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["totalTrends"], 2);
    assert_eq!(body["data"]["totalMentions"], 0);
    let stages = body["data"]["byMaturityStage"].as_array().unwrap();
    assert!(!stages.is_empty());
}

#[tokio::test]
async fn test_fast_forward_month_empty_for_fresh_trends() {
    let (app, _pool) = setup_app().await;

    create_trend(&app, "Brand New", 5).await;

    let response = app
        .oneshot(get("/api/v1/trends/fast-forward/month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_fast_forward_month_reports_then_vs_now_comparison() {
    let (app, pool) = setup_app().await;

    let data = create_trend(&app, "Month Old Trend", 10).await;
    let id = data["id"].as_str().unwrap().to_string();

    // Backdate detection to midday of the calendar day one month ago
    let day = Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(1))
        .unwrap();
    let detected = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
    sqlx::query("UPDATE trends SET first_detected_at = ? WHERE id = ?")
        .bind(detected)
        .bind(&id)
        .execute(&pool)
        .await
        .unwrap();

    // A later snapshot showing where the trend went after detection
    db::history::insert_snapshot(
        &pool,
        &TrendSnapshot {
            id: Uuid::new_v4(),
            trend_id: Uuid::parse_str(&id).unwrap(),
            snapshot_date: Utc::now(),
            mentions_24h: 25,
            maturity_stage: MaturityStage::Discovery,
            accuracy_status: AccuracyStatus::Rising,
        },
    )
    .await
    .unwrap();

    let response = app
        .oneshot(get("/api/v1/trends/fast-forward/month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);

    let comparison = &items[0]["comparison"];
    assert_eq!(comparison["initialMentions"], 10);
    assert_eq!(comparison["currentMentions"], 25);
    assert_eq!(comparison["initialStage"], "DISCOVERY");
    assert_eq!(comparison["initialAccuracy"], "TOO_EARLY");
    assert_eq!(comparison["currentAccuracy"], "RISING");
    assert_eq!(comparison["growth"], "150.0%");
    assert!(items[0]["redditMentions"].as_array().unwrap().is_empty());
    assert!(items[0]["latestSnapshot"].is_object());
}

#[tokio::test]
async fn test_fast_forward_month_window_excludes_next_midnight() {
    let (app, pool) = setup_app().await;

    let inside = create_trend(&app, "Inside The Day", 5).await;
    let boundary = create_trend(&app, "At Next Midnight", 5).await;

    let day = Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(1))
        .unwrap();
    let noon = day.and_hms_opt(12, 0, 0).unwrap().and_utc();
    let next_midnight = day
        .succ_opt()
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();

    for (trend, detected) in [(&inside, noon), (&boundary, next_midnight)] {
        sqlx::query("UPDATE trends SET first_detected_at = ? WHERE id = ?")
            .bind(detected)
            .bind(trend["id"].as_str().unwrap())
            .execute(&pool)
            .await
            .unwrap();
    }

    let response = app
        .oneshot(get("/api/v1/trends/fast-forward/month"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Inside The Day");
}

// =============================================================================
// Users and sessions
// =============================================================================

#[tokio::test]
async fn test_register_validation_aggregates_problems() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/users/register",
            json!({ "email": "not-an-email", "password": "abc" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Invalid email address"));
    assert!(message.contains("at least 6 characters"));
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let (app, _pool) = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/users/register",
            json!({ "email": "ada@example.com", "password": "hunter22", "name": "Ada" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
    // Password material never serializes
    assert!(body["data"]["passwordHash"].is_null());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "ada@example.com", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    assert!(cookies.iter().all(|c| c.contains("HttpOnly")));

    let access_cookie = cookies
        .iter()
        .find(|c| c.starts_with("accessToken="))
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let mut request = get("/api/v1/users/me");
    request
        .headers_mut()
        .insert(header::COOKIE, access_cookie.parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["name"], "Ada");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let (app, pool) = setup_app().await;
    insert_test_user(&pool, "bob@example.com", "correct1", "USER").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "bob@example.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (app, _pool) = setup_app().await;

    for uri in ["/api/v1/users/me", "/api/v1/users"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {}", uri);
    }

    // Tampered token is rejected too
    let mut request = get("/api/v1/users/me");
    request.headers_mut().insert(
        header::COOKIE,
        "accessToken=bogus.signature".parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_list_is_admin_only() {
    let (app, pool) = setup_app().await;
    let user_id = insert_test_user(&pool, "user@example.com", "secret1", "USER").await;
    let admin_id = insert_test_user(&pool, "admin@example.com", "secret2", "ADMIN").await;

    let response = app
        .clone()
        .oneshot(with_session(get("/api/v1/users"), user_id, "USER"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(with_session(get("/api/v1/users"), admin_id, "ADMIN"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_profile() {
    let (app, pool) = setup_app().await;
    let user_id = insert_test_user(&pool, "carol@example.com", "secret1", "USER").await;

    let request = with_session(
        json_request(
            "PATCH",
            "/api/v1/users/profile",
            json!({ "name": "Carol" }),
        ),
        user_id,
        "USER",
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["name"], "Carol");
    assert_eq!(body["data"]["email"], "carol@example.com");
}

#[tokio::test]
async fn test_rebuild_similar_is_admin_only() {
    let (app, pool) = setup_app().await;
    let user_id = insert_test_user(&pool, "user@example.com", "secret1", "USER").await;
    let admin_id = insert_test_user(&pool, "admin@example.com", "secret2", "ADMIN").await;

    let response = app
        .clone()
        .oneshot(with_session(
            json_request("POST", "/api/v1/trends/rebuild-similar", json!({})),
            user_id,
            "USER",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(with_session(
            json_request("POST", "/api/v1/trends/rebuild-similar", json!({})),
            admin_id,
            "ADMIN",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["data"]["totalTrends"], 0);
    assert_eq!(body["data"]["totalRelationships"], 0);
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(json_request("POST", "/api/v1/auth/logout", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}
