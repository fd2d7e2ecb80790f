//! Lead handlers

use axum::{extract::State, Json};
use uuid::Uuid;

use crm_core::services::LeadListing;
use crm_core::{Lead, LeadFields};

use crate::dto::{AssignAgentRequest, Deleted, LeadCategoryRequest};
use crate::extractor::{ApiJson, ApiPath, AuthUser};
use crate::handlers::{ApiCreated, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /leads
pub async fn list(State(state): State<AppState>, AuthUser(principal): AuthUser) -> ApiResult<LeadListing> {
    let listing = state.leads.list(&principal).await?;
    Ok(Json(ApiResponse::success(listing)))
}

/// GET /leads/{id}
pub async fn detail(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Lead> {
    let lead = state.leads.get(&principal, &id).await?;
    Ok(Json(ApiResponse::success(lead)))
}

/// POST /leads
pub async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(payload): ApiJson<LeadFields>,
) -> ApiCreated<Lead> {
    let lead = state.leads.create(&principal, payload).await?;
    Ok(ApiResponse::created(lead))
}

/// PUT /leads/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<LeadFields>,
) -> ApiResult<Lead> {
    let lead = state.leads.update(&principal, &id, payload).await?;
    Ok(Json(ApiResponse::success(lead)))
}

/// DELETE /leads/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.leads.delete(&principal, &id).await?;
    Ok(Json(ApiResponse::success(Deleted { id })))
}

/// POST /leads/{id}/assign
pub async fn assign_agent(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AssignAgentRequest>,
) -> ApiResult<Lead> {
    let lead = state.leads.assign_agent(&principal, &id, &payload.agent_id).await?;
    Ok(Json(ApiResponse::success(lead)))
}

/// PUT /leads/{id}/category
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<LeadCategoryRequest>,
) -> ApiResult<Lead> {
    let lead = state.leads.update_category(&principal, &id, payload.category_id).await?;
    Ok(Json(ApiResponse::success(lead)))
}
