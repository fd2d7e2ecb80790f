//! Category handlers

use axum::{extract::State, Json};
use uuid::Uuid;

use crm_core::services::{CategoryDetail, CategoryListing};
use crm_core::Category;

use crate::dto::{CategoryRequest, Deleted};
use crate::extractor::{ApiJson, ApiPath, AuthUser};
use crate::handlers::{ApiCreated, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /leads/categories
pub async fn list(State(state): State<AppState>, AuthUser(principal): AuthUser) -> ApiResult<CategoryListing> {
    let listing = state.categories.list(&principal).await?;
    Ok(Json(ApiResponse::success(listing)))
}

/// GET /leads/categories/{id}
pub async fn detail(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<CategoryDetail> {
    let detail = state.categories.get(&principal, &id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// POST /leads/categories
pub async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> ApiCreated<Category> {
    let category = state.categories.create(&principal, &payload.name).await?;
    Ok(ApiResponse::created(category))
}

/// PUT /leads/categories/{id}
pub async fn rename(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<CategoryRequest>,
) -> ApiResult<Category> {
    let category = state.categories.rename(&principal, &id, &payload.name).await?;
    Ok(Json(ApiResponse::success(category)))
}

/// DELETE /leads/categories/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.categories.delete(&principal, &id).await?;
    Ok(Json(ApiResponse::success(Deleted { id })))
}
