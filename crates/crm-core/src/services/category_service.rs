//! Lead categories

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::access::{LeadFilter, Principal};
use crate::domain::{Category, Lead};
use crate::error::DomainError;
use crate::repositories::Repositories;

#[derive(Debug, Clone, Serialize)]
pub struct CategoryListing {
    pub categories: Vec<Category>,
    /// Visible leads without a category.
    pub unassigned_lead_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub category: Category,
    pub leads: Vec<Lead>,
}

pub struct CategoryService {
    repos: Repositories,
}

impl CategoryService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list(&self, principal: &Principal) -> Result<CategoryListing, DomainError> {
        let categories = self.repos.categories.list(&principal.organisation_id).await?;
        let uncategorized = LeadFilter::for_scope(principal.lead_scope()).uncategorized();
        let unassigned_lead_count = self.repos.leads.count(&uncategorized).await?;

        Ok(CategoryListing {
            categories,
            unassigned_lead_count,
        })
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<CategoryDetail, DomainError> {
        let category = self.find(&principal.organisation_id, id).await?;
        let filter = LeadFilter::for_scope(principal.lead_scope()).in_category(category.id);
        let leads = self.repos.leads.list(&filter).await?;
        Ok(CategoryDetail { category, leads })
    }

    pub async fn create(&self, principal: &Principal, name: &str) -> Result<Category, DomainError> {
        let organisation_id = principal.require_organisor()?;
        let category = Category::new(organisation_id, name)?;
        self.ensure_name_free(&category).await?;

        let category = self.repos.categories.create(&category).await?;
        info!(category_id = %category.id, organisation_id = %organisation_id, "Category created");
        Ok(category)
    }

    pub async fn rename(&self, principal: &Principal, id: &Uuid, name: &str) -> Result<Category, DomainError> {
        let organisation_id = principal.require_organisor()?;
        let mut category = self.find(&organisation_id, id).await?;
        category.rename(name)?;
        self.ensure_name_free(&category).await?;

        let category = self.repos.categories.update(&category).await?;
        info!(category_id = %category.id, "Category renamed");
        Ok(category)
    }

    /// Leads in the category become uncategorized.
    pub async fn delete(&self, principal: &Principal, id: &Uuid) -> Result<(), DomainError> {
        let organisation_id = principal.require_organisor()?;
        if !self.repos.categories.delete(&organisation_id, id).await? {
            return Err(DomainError::NotFound("Category"));
        }
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    async fn find(&self, organisation_id: &Uuid, id: &Uuid) -> Result<Category, DomainError> {
        self.repos
            .categories
            .find(organisation_id, id)
            .await?
            .ok_or(DomainError::NotFound("Category"))
    }

    async fn ensure_name_free(&self, category: &Category) -> Result<(), DomainError> {
        let existing = self
            .repos
            .categories
            .find_by_name(&category.organisation_id, &category.name)
            .await?;
        match existing {
            Some(other) if other.id != category.id => Err(DomainError::field(
                "name",
                "Category with this Name already exists.",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;

    #[tokio::test]
    async fn test_listing_counts_visible_uncategorized_leads() {
        let store = InMemoryStore::new();
        let (user, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let agent = store.seed_agent(organisation.id, "field.agent", "agent-pass-1");
        let converted = store.seed_category(organisation.id, "Converted");
        store.seed_lead(organisation.id, None, None);
        store.seed_lead(organisation.id, Some(agent.id), None);
        store.seed_lead(organisation.id, Some(agent.id), Some(converted.id));
        let categories = CategoryService::new(store.repositories());

        let boss = Principal::organisor(&user, &organisation, Uuid::new_v4());
        let listing = categories.list(&boss).await.unwrap();
        assert_eq!(listing.categories.len(), 1);
        assert_eq!(listing.unassigned_lead_count, 2);

        let as_agent = categories.list(&Principal::agent(&agent, Uuid::new_v4())).await.unwrap();
        assert_eq!(as_agent.unassigned_lead_count, 1);
    }

    #[tokio::test]
    async fn test_detail_is_scoped() {
        let store = InMemoryStore::new();
        let (user, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let (rival_user, rival) = store.seed_organisor("rival", "s3cure-pass");
        let category = store.seed_category(organisation.id, "Contacted");
        let lead = store.seed_lead(organisation.id, None, Some(category.id));
        let categories = CategoryService::new(store.repositories());

        let boss = Principal::organisor(&user, &organisation, Uuid::new_v4());
        let detail = categories.get(&boss, &category.id).await.unwrap();
        assert_eq!(detail.leads, vec![lead]);

        let outsider = Principal::organisor(&rival_user, &rival, Uuid::new_v4());
        assert!(matches!(
            categories.get(&outsider, &category.id).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_names_are_unique_per_organisation() {
        let store = InMemoryStore::new();
        let (user, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let (rival_user, rival) = store.seed_organisor("rival", "s3cure-pass");
        let categories = CategoryService::new(store.repositories());
        let boss = Principal::organisor(&user, &organisation, Uuid::new_v4());

        let first = categories.create(&boss, "Contacted").await.unwrap();
        assert!(matches!(
            categories.create(&boss, "contacted").await,
            Err(DomainError::Validation(e)) if e.contains("name")
        ));

        let outsider = Principal::organisor(&rival_user, &rival, Uuid::new_v4());
        assert!(categories.create(&outsider, "Contacted").await.is_ok());

        let renamed = categories.rename(&boss, &first.id, "Contacted").await.unwrap();
        assert_eq!(renamed.id, first.id);
    }

    #[tokio::test]
    async fn test_delete_uncategorizes_leads() {
        let store = InMemoryStore::new();
        let (user, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let category = store.seed_category(organisation.id, "Unconverted");
        let lead = store.seed_lead(organisation.id, None, Some(category.id));
        let categories = CategoryService::new(store.repositories());
        let boss = Principal::organisor(&user, &organisation, Uuid::new_v4());

        categories.delete(&boss, &category.id).await.unwrap();

        assert!(store.lead(&lead.id).unwrap().category_id.is_none());
        assert!(matches!(
            categories.delete(&boss, &category.id).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_agents_cannot_manage_categories() {
        let store = InMemoryStore::new();
        let (_, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let agent = store.seed_agent(organisation.id, "field.agent", "agent-pass-1");
        let categories = CategoryService::new(store.repositories());
        let caller = Principal::agent(&agent, Uuid::new_v4());

        assert!(matches!(
            categories.create(&caller, "Hot").await,
            Err(DomainError::Forbidden(_))
        ));
    }
}
