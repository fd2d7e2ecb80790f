//! HTTP handlers

pub mod public;
pub mod auth;
pub mod password_reset;
pub mod leads;
pub mod categories;
pub mod agents;

use axum::{http::StatusCode, Json};

use crate::error::ApiError;
use crate::response::ApiResponse;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
pub type ApiCreated<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;
