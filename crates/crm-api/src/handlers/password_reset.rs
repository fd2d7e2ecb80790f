//! Password reset handlers

use axum::{extract::State, Json};

use crm_core::services::SetPasswordCommand;
use crm_core::DomainError;

use crate::dto::{PasswordResetRequest, ResetLinkStatus, StatusResponse};
use crate::extractor::{ApiJson, ApiPath};
use crate::handlers::ApiResult;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /reset-password - always answers "done"
pub async fn request_reset(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PasswordResetRequest>,
) -> ApiResult<StatusResponse> {
    state.password_reset.request_reset(&payload.email).await?;
    Ok(Json(ApiResponse::success(StatusResponse {
        status: "done",
        message: "We've emailed you instructions for setting your password, if an account exists with the email you entered.",
    })))
}

/// GET /reset-confirm/{uidb64}/{token}
pub async fn check_link(
    State(state): State<AppState>,
    ApiPath((uidb64, token)): ApiPath<(String, String)>,
) -> ApiResult<ResetLinkStatus> {
    let valid = match state.password_reset.check_link(&uidb64, &token).await {
        Ok(_) => true,
        Err(DomainError::InvalidResetLink) => false,
        Err(e) => return Err(e.into()),
    };
    Ok(Json(ApiResponse::success(ResetLinkStatus { valid })))
}

/// POST /reset-confirm/{uidb64}/{token}
pub async fn confirm_reset(
    State(state): State<AppState>,
    ApiPath((uidb64, token)): ApiPath<(String, String)>,
    ApiJson(payload): ApiJson<SetPasswordCommand>,
) -> ApiResult<StatusResponse> {
    state.password_reset.confirm_reset(&uidb64, &token, payload).await?;
    Ok(Json(ApiResponse::success(StatusResponse {
        status: "complete",
        message: "Your password has been set. You may go ahead and log in now.",
    })))
}
