//! User repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::{Organisation, User};
use crate::error::DomainError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Live (not removed) user by id.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
    /// Case-insensitive username lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
    /// Case-insensitive e-mail lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    /// Inserts an organisor and its organisation in one transaction.
    async fn create_organisor(&self, user: &User, organisation: &Organisation) -> Result<(User, Organisation), DomainError>;
    async fn update(&self, user: &User) -> Result<User, DomainError>;
    /// Sets `last_login` only, leaving every other column as stored.
    async fn record_login(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
}
