//! Organisation repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::Organisation;
use crate::error::DomainError;

#[async_trait]
pub trait OrganisationRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organisation>, DomainError>;
    async fn find_by_owner(&self, owner_id: &Uuid) -> Result<Option<Organisation>, DomainError>;
}
