//! Request and response payloads that are not domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crm_core::AgentProfile;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignAgentRequest {
    pub agent_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LeadCategoryRequest {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

/// Agent as shown to its organisor.
#[derive(Debug, Serialize)]
pub struct AgentDto {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<AgentProfile> for AgentDto {
    fn from(agent: AgentProfile) -> Self {
        Self {
            id: agent.id,
            organisation_id: agent.organisation_id,
            user_id: agent.user.id,
            username: agent.user.username,
            email: agent.user.email,
            first_name: agent.user.first_name,
            last_name: agent.user.last_name,
            created_at: agent.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ResetLinkStatus {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
}
