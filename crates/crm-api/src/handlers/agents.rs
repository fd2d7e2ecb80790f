//! Agent handlers (organisor only)

use axum::{extract::State, Json};
use uuid::Uuid;

use crm_core::services::AgentCommand;

use crate::dto::{AgentDto, Deleted};
use crate::extractor::{ApiJson, ApiPath, AuthUser};
use crate::handlers::{ApiCreated, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /agents
pub async fn list(State(state): State<AppState>, AuthUser(principal): AuthUser) -> ApiResult<Vec<AgentDto>> {
    let agents = state.agents.list(&principal).await?;
    Ok(Json(ApiResponse::success(agents.into_iter().map(AgentDto::from).collect())))
}

/// GET /agents/{id}
pub async fn detail(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<AgentDto> {
    let agent = state.agents.get(&principal, &id).await?;
    Ok(Json(ApiResponse::success(AgentDto::from(agent))))
}

/// POST /agents
pub async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiJson(payload): ApiJson<AgentCommand>,
) -> ApiCreated<AgentDto> {
    let agent = state.agents.invite(&principal, payload).await?;
    Ok(ApiResponse::created(AgentDto::from(agent)))
}

/// PUT /agents/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AgentCommand>,
) -> ApiResult<AgentDto> {
    let agent = state.agents.update(&principal, &id, payload).await?;
    Ok(Json(ApiResponse::success(AgentDto::from(agent))))
}

/// DELETE /agents/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Deleted> {
    state.agents.remove(&principal, &id).await?;
    Ok(Json(ApiResponse::success(Deleted { id })))
}
