//! Category repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::Category;
use crate::error::DomainError;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn list(&self, organisation_id: &Uuid) -> Result<Vec<Category>, DomainError>;
    async fn find(&self, organisation_id: &Uuid, id: &Uuid) -> Result<Option<Category>, DomainError>;
    async fn find_by_name(&self, organisation_id: &Uuid, name: &str) -> Result<Option<Category>, DomainError>;
    async fn create(&self, category: &Category) -> Result<Category, DomainError>;
    async fn update(&self, category: &Category) -> Result<Category, DomainError>;
    /// Leads in the category become uncategorized.
    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError>;
}
