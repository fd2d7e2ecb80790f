//! PostgreSQL organisation repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crm_core::domain::Organisation;
use crm_core::error::DomainError;
use crm_core::repositories::OrganisationRepository;

use super::db_error;
use super::user_repo_impl::OrganisationRow;

pub struct PgOrganisationRepository {
    pool: PgPool,
}

impl PgOrganisationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganisationRepository for PgOrganisationRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organisation>, DomainError> {
        let row: Option<OrganisationRow> = sqlx::query_as(
            "SELECT id, owner_id, name, created_at FROM organisations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding organisation by id"))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_owner(&self, owner_id: &Uuid) -> Result<Option<Organisation>, DomainError> {
        let row: Option<OrganisationRow> = sqlx::query_as(
            "SELECT id, owner_id, name, created_at FROM organisations WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding organisation by owner"))?;

        Ok(row.map(Into::into))
    }
}
