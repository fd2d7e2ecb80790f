//! Agent repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::AgentProfile;
use crate::error::DomainError;

#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn list(&self, organisation_id: &Uuid) -> Result<Vec<AgentProfile>, DomainError>;
    async fn find(&self, organisation_id: &Uuid, id: &Uuid) -> Result<Option<AgentProfile>, DomainError>;
    async fn find_by_user(&self, user_id: &Uuid) -> Result<Option<AgentProfile>, DomainError>;
    /// Inserts the wrapped user and the profile in one transaction.
    async fn create(&self, agent: &AgentProfile) -> Result<AgentProfile, DomainError>;
    /// Persists the wrapped user's profile fields.
    async fn update(&self, agent: &AgentProfile) -> Result<AgentProfile, DomainError>;
    /// Removes the profile, unassigns its leads, soft-deletes the user and
    /// revokes its sessions. `false` when nothing matched.
    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError>;
}
