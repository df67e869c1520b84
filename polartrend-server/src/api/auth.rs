//! Login/logout endpoints and session cookie middleware
//!
//! Tokens are signed with the server secret from the settings table and
//! delivered as HttpOnly cookies. Protected routes read the `accessToken`
//! cookie, verify it, and expose the claims to handlers via request
//! extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use polartrend_common::auth::{issue_token, verify_token, SessionClaims};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::ApiResponse;
use crate::db::{settings, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Pull one cookie value out of the Cookie header
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn session_cookie(name: &str, value: &str, max_age_secs: i64) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        name, value, max_age_secs
    )
}

/// POST /api/v1/auth/login
///
/// Verifies the password and issues access and refresh tokens as HttpOnly
/// cookies. Bad credentials always answer 401 without distinguishing
/// unknown email from wrong password.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Response> {
    let user = users::get_by_email(&state.db, &body.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    if !polartrend_common::auth::verify_password(
        &body.password,
        &user.password_salt,
        &user.password_hash,
    ) {
        warn!(email = %body.email, "Login failed");
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let access_ttl = settings::get_i64(&state.db, "access_token_ttl_secs", 3600).await;
    let refresh_ttl = settings::get_i64(&state.db, "refresh_token_ttl_secs", 7_776_000).await;
    let now_ms = Utc::now().timestamp_millis();

    let access_token = issue_token(
        &SessionClaims {
            user_id: user.id,
            role: user.role.clone(),
            expires_at: now_ms + access_ttl * 1000,
        },
        state.session_secret,
    );
    let refresh_token = issue_token(
        &SessionClaims {
            user_id: user.id,
            role: user.role.clone(),
            expires_at: now_ms + refresh_ttl * 1000,
        },
        state.session_secret,
    );

    debug!(email = %user.email, "User logged in");

    let headers = AppendHeaders([
        (
            header::SET_COOKIE,
            session_cookie(ACCESS_COOKIE, &access_token, access_ttl),
        ),
        (
            header::SET_COOKIE,
            session_cookie(REFRESH_COOKIE, &refresh_token, refresh_ttl),
        ),
    ]);

    let body = Json(ApiResponse::ok(
        "User logged in successfully",
        serde_json::json!({
            "accessToken": access_token,
            "refreshToken": refresh_token,
        }),
    ));

    Ok((StatusCode::CREATED, headers, body).into_response())
}

/// POST /api/v1/auth/logout
///
/// Clears both session cookies.
pub async fn logout() -> Response {
    let headers = AppendHeaders([
        (header::SET_COOKIE, session_cookie(ACCESS_COOKIE, "", 0)),
        (header::SET_COOKIE, session_cookie(REFRESH_COOKIE, "", 0)),
    ]);

    let body = Json(ApiResponse::<()> {
        success: true,
        message: "User logged out successfully".to_string(),
        data: None,
        meta: None,
    });

    (StatusCode::OK, headers, body).into_response()
}

/// Session middleware for protected routes
///
/// Verifies the `accessToken` cookie and inserts the claims into request
/// extensions for downstream handlers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_cookie(request.headers(), ACCESS_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("You are not authorized".to_string()))?;

    let claims = verify_token(&token, state.session_secret, Utc::now().timestamp_millis())
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Reject non-admin sessions
pub fn require_admin(claims: &SessionClaims) -> ApiResult<()> {
    if claims.role != "ADMIN" {
        return Err(ApiError::Unauthorized(
            "You are not authorized".to_string(),
        ));
    }
    Ok(())
}
