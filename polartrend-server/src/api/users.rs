//! User registration and profile endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use polartrend_common::auth::{generate_salt, hash_password, SessionClaims};
use polartrend_common::db::models::User;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::{auth::require_admin, ApiResponse};
use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// POST /api/v1/users/register
///
/// Validation failures are aggregated into a single 400 message; duplicate
/// email answers 409.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let mut problems = Vec::new();

    let email = body.email.as_deref().map(str::trim).unwrap_or("");
    if email.is_empty() {
        problems.push("Email is required");
    } else if !email.contains('@') {
        problems.push("Invalid email address");
    }

    let password = body.password.as_deref().unwrap_or("");
    if password.is_empty() {
        problems.push("Password is required");
    } else if password.len() < 6 {
        problems.push("Password must be at least 6 characters");
    }

    if !problems.is_empty() {
        return Err(ApiError::BadRequest(problems.join("; ")));
    }

    if users::get_by_email(&state.db, email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Email already registered: {}",
            email
        )));
    }

    let salt = generate_salt();
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: body.name.clone(),
        password_hash: hash_password(password, &salt),
        password_salt: salt,
        role: "USER".to_string(),
        created_at: now,
        updated_at: now,
    };

    users::insert_user(&state.db, &user).await?;
    info!(email = %user.email, "User registered");

    let body = Json(ApiResponse::ok("User created successfully", user));
    Ok((StatusCode::CREATED, body).into_response())
}

/// GET /api/v1/users/me (auth)
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = users::get_by_id(&state.db, claims.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok("User retrieved successfully", user)))
}

/// GET /api/v1/users (admin)
pub async fn get_all_users(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    require_admin(&claims)?;

    let result = users::list_all(&state.db).await?;
    Ok(Json(ApiResponse::ok("Users retrieved successfully", result)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// PATCH /api/v1/users/profile (auth)
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(body): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    if let Some(email) = body.email.as_deref() {
        if !email.contains('@') {
            return Err(ApiError::BadRequest("Invalid email address".to_string()));
        }
        if let Some(existing) = users::get_by_email(&state.db, email).await? {
            if existing.id != claims.user_id {
                return Err(ApiError::Conflict(format!(
                    "Email already registered: {}",
                    email
                )));
            }
        }
    }

    users::update_profile(
        &state.db,
        claims.user_id,
        body.name.as_deref(),
        body.email.as_deref(),
    )
    .await?;

    let user = users::get_by_id(&state.db, claims.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(
        "User profile updated successfully",
        user,
    )))
}
