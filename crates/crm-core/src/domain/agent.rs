// ============================================================================
// CRM Core - Agent Profile Entity
// File: crates/crm-core/src/domain/agent.rs
// Description: Agent account scoped to one organisation
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{User, UserRole};
use crate::error::DomainError;

/// Wraps one agent `User`; the organisation is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl AgentProfile {
    pub fn new(organisation_id: Uuid, user: User) -> Result<Self, DomainError> {
        if user.role != UserRole::Agent {
            return Err(DomainError::InternalError(format!(
                "user {} is not an agent account",
                user.id
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            organisation_id,
            user,
            created_at: Utc::now(),
        })
    }
}
