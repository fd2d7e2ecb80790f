// ============================================================================
// CRM API - Auth Handlers
// File: crates/crm-api/src/handlers/auth.rs
// ============================================================================
//! Authentication HTTP handlers (signup, login, logout)

use axum::{extract::State, Json};

use crm_core::services::{LoginResult, SignupCommand, UserInfo};

use crate::dto::{LoginRequest, StatusResponse};
use crate::error::ApiError;
use crate::extractor::{ApiJson, AuthUser};
use crate::handlers::{ApiCreated, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Signup handler - POST /signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupCommand>,
) -> ApiCreated<UserInfo> {
    let user = state.auth.signup(payload).await?;
    Ok(ApiResponse::created(user))
}

/// Login handler - POST /login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<LoginResult> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Username and password are required".to_string()));
    }

    state.login_throttle.check(&payload.username)?;

    let result = state.auth.login(&payload.username, &payload.password).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Logout handler - POST /logout
pub async fn logout(State(state): State<AppState>, AuthUser(principal): AuthUser) -> ApiResult<StatusResponse> {
    state.auth.logout(&principal).await?;
    Ok(Json(ApiResponse::success(StatusResponse {
        status: "logged_out",
        message: "Logged out successfully",
    })))
}
