//! Landing page and health check

use axum::{extract::State, Json};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Landing {
    name: String,
    links: Links,
}

#[derive(Serialize)]
struct Links {
    signup: &'static str,
    login: &'static str,
    leads: &'static str,
    agents: &'static str,
    reset_password: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn landing(State(state): State<AppState>) -> Json<ApiResponse<Landing>> {
    Json(ApiResponse::success(Landing {
        name: state.app_name.clone(),
        links: Links {
            signup: "/signup",
            login: "/login",
            leads: "/leads",
            agents: "/agents",
            reset_password: "/reset-password",
        },
    }))
}

pub async fn health_check() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
