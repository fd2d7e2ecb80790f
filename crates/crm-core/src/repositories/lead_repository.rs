//! Lead repository trait (port)
//!
//! Reads take a [`LeadFilter`] so that they are always scoped to an
//! organisation; writes name the organisation explicitly.

use async_trait::async_trait;
use uuid::Uuid;
use crate::access::LeadFilter;
use crate::domain::Lead;
use crate::error::DomainError;

#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<Lead>, DomainError>;
    async fn count(&self, filter: &LeadFilter) -> Result<i64, DomainError>;
    async fn find(&self, filter: &LeadFilter, id: &Uuid) -> Result<Option<Lead>, DomainError>;
    async fn create(&self, lead: &Lead) -> Result<Lead, DomainError>;
    /// Updates the lead matching both id and organisation.
    async fn update(&self, lead: &Lead) -> Result<Lead, DomainError>;
    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError>;
}
