// ============================================================================
// CRM Infrastructure - PostgreSQL Lead Repository
// File: crates/crm-infrastructure/src/database/postgres/lead_repo_impl.rs
// ============================================================================
//! Lead reads are assembled with a `QueryBuilder` from the caller's
//! `LeadFilter`, so the organisation predicate is always present.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crm_core::access::{Assignment, CategoryMatch, LeadFilter};
use crm_core::domain::Lead;
use crm_core::error::DomainError;
use crm_core::repositories::LeadRepository;

use super::db_error;

const LEAD_COLUMNS: &str = "id, organisation_id, agent_id, category_id, first_name, last_name, \
     age, description, phone_number, email, date_added, modified_at";

pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct LeadRow {
    id: Uuid,
    organisation_id: Uuid,
    agent_id: Option<Uuid>,
    category_id: Option<Uuid>,
    first_name: String,
    last_name: String,
    age: i32,
    description: String,
    phone_number: String,
    email: String,
    date_added: DateTime<Utc>,
    modified_at: Option<DateTime<Utc>>,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Lead {
            id: row.id,
            organisation_id: row.organisation_id,
            agent_id: row.agent_id,
            category_id: row.category_id,
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            description: row.description,
            phone_number: row.phone_number,
            email: row.email,
            date_added: row.date_added,
            modified_at: row.modified_at,
        }
    }
}

/// Appends the `WHERE` clause for `filter`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &LeadFilter) {
    builder
        .push(" WHERE organisation_id = ")
        .push_bind(filter.organisation_id());

    if let Some(agent_id) = filter.agent_id() {
        builder.push(" AND agent_id = ").push_bind(agent_id);
    }

    match filter.assignment() {
        Assignment::Any => {}
        Assignment::Assigned => {
            builder.push(" AND agent_id IS NOT NULL");
        }
        Assignment::Unassigned => {
            builder.push(" AND agent_id IS NULL");
        }
    }

    match filter.category() {
        CategoryMatch::Any => {}
        CategoryMatch::Uncategorized => {
            builder.push(" AND category_id IS NULL");
        }
        CategoryMatch::Category(category_id) => {
            builder.push(" AND category_id = ").push_bind(category_id);
        }
    }
}

#[async_trait]
impl LeadRepository for PgLeadRepository {
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<Lead>, DomainError> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM leads", LEAD_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY date_added");

        let rows: Vec<LeadRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing leads"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count(&self, filter: &LeadFilter) -> Result<i64, DomainError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM leads");
        push_filter(&mut builder, filter);

        builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting leads"))
    }

    async fn find(&self, filter: &LeadFilter, id: &Uuid) -> Result<Option<Lead>, DomainError> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM leads", LEAD_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" AND id = ").push_bind(*id);

        let row: Option<LeadRow> = builder
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("finding lead"))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, lead: &Lead) -> Result<Lead, DomainError> {
        let row: LeadRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO leads ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {cols}
            "#,
            cols = LEAD_COLUMNS
        ))
        .bind(lead.id)
        .bind(lead.organisation_id)
        .bind(lead.agent_id)
        .bind(lead.category_id)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(lead.age)
        .bind(&lead.description)
        .bind(&lead.phone_number)
        .bind(&lead.email)
        .bind(lead.date_added)
        .bind(lead.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating lead"))?;

        Ok(row.into())
    }

    async fn update(&self, lead: &Lead) -> Result<Lead, DomainError> {
        let row: Option<LeadRow> = sqlx::query_as(&format!(
            r#"
            UPDATE leads
            SET
                agent_id = $3,
                category_id = $4,
                first_name = $5,
                last_name = $6,
                age = $7,
                description = $8,
                phone_number = $9,
                email = $10,
                modified_at = $11
            WHERE id = $1 AND organisation_id = $2
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(lead.id)
        .bind(lead.organisation_id)
        .bind(lead.agent_id)
        .bind(lead.category_id)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(lead.age)
        .bind(&lead.description)
        .bind(&lead.phone_number)
        .bind(&lead.email)
        .bind(lead.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("updating lead"))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Lead"))
    }

    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("deleting lead"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::access::Scope;

    fn sql(filter: &LeadFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM leads");
        push_filter(&mut builder, filter);
        builder.sql().to_string()
    }

    #[test]
    fn test_organisation_predicate_always_present() {
        let organisation_id = Uuid::new_v4();
        let filter = LeadFilter::for_scope(Scope::Organisation { organisation_id });

        assert_eq!(sql(&filter), "SELECT id FROM leads WHERE organisation_id = $1");
        assert_eq!(
            sql(&filter.unassigned().uncategorized()),
            "SELECT id FROM leads WHERE organisation_id = $1 AND agent_id IS NULL AND category_id IS NULL"
        );
    }

    #[test]
    fn test_agent_scope_binds_agent() {
        let filter = LeadFilter::for_scope(Scope::AgentLeads {
            organisation_id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
        })
        .in_category(Uuid::new_v4());

        assert_eq!(
            sql(&filter),
            "SELECT id FROM leads WHERE organisation_id = $1 AND agent_id = $2 AND category_id = $3"
        );
    }
}
