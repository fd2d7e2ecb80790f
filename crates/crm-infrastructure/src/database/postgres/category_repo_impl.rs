//! PostgreSQL category repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crm_core::domain::Category;
use crm_core::error::DomainError;
use crm_core::repositories::CategoryRepository;

use super::{db_error, write_error};

pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    organisation_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            organisation_id: row.organisation_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self, organisation_id: &Uuid) -> Result<Vec<Category>, DomainError> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, organisation_id, name, created_at
            FROM categories
            WHERE organisation_id = $1
            ORDER BY name
            "#
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing categories"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find(&self, organisation_id: &Uuid, id: &Uuid) -> Result<Option<Category>, DomainError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, organisation_id, name, created_at
            FROM categories
            WHERE id = $1 AND organisation_id = $2
            "#
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding category"))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, organisation_id: &Uuid, name: &str) -> Result<Option<Category>, DomainError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, organisation_id, name, created_at
            FROM categories
            WHERE organisation_id = $1 AND LOWER(name) = LOWER($2)
            "#
        )
        .bind(organisation_id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding category by name"))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, category: &Category) -> Result<Category, DomainError> {
        let row: CategoryRow = sqlx::query_as(
            r#"
            INSERT INTO categories (id, organisation_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organisation_id, name, created_at
            "#
        )
        .bind(category.id)
        .bind(category.organisation_id)
        .bind(&category.name)
        .bind(category.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error("creating category"))?;

        info!("Category created: {}", row.id);
        Ok(row.into())
    }

    async fn update(&self, category: &Category) -> Result<Category, DomainError> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            UPDATE categories
            SET name = $3
            WHERE id = $1 AND organisation_id = $2
            RETURNING id, organisation_id, name, created_at
            "#
        )
        .bind(category.id)
        .bind(category.organisation_id)
        .bind(&category.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error("updating category"))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Category"))
    }

    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError> {
        // leads.category_id is cleared by ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting category"))?;

        Ok(result.rows_affected() > 0)
    }
}
