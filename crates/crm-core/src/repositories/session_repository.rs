//! Session repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::UserSession;
use crate::error::DomainError;

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &UserSession) -> Result<UserSession, DomainError>;
    /// Session that is neither revoked nor expired at `now`.
    async fn find_active(&self, id: &Uuid, now: DateTime<Utc>) -> Result<Option<UserSession>, DomainError>;
    async fn revoke(&self, id: &Uuid) -> Result<(), DomainError>;
    async fn revoke_all_for_user(&self, user_id: &Uuid) -> Result<(), DomainError>;
}
