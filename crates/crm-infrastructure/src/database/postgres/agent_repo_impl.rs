// ============================================================================
// CRM Infrastructure - PostgreSQL Agent Repository
// File: crates/crm-infrastructure/src/database/postgres/agent_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crm_core::domain::AgentProfile;
use crm_core::error::DomainError;
use crm_core::repositories::AgentRepository;

use super::user_repo_impl::{insert_user, UserRow};
use super::{db_error, write_error};

pub struct PgAgentRepository {
    pool: PgPool,
}

impl PgAgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Agent columns are aliased so the user columns keep their own names
#[derive(Debug, FromRow)]
struct AgentRow {
    agent_id: Uuid,
    organisation_id: Uuid,
    agent_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    user: UserRow,
}

impl From<AgentRow> for AgentProfile {
    fn from(row: AgentRow) -> Self {
        AgentProfile {
            id: row.agent_id,
            organisation_id: row.organisation_id,
            user: row.user.into(),
            created_at: row.agent_created_at,
        }
    }
}

#[async_trait]
impl AgentRepository for PgAgentRepository {
    async fn list(&self, organisation_id: &Uuid) -> Result<Vec<AgentProfile>, DomainError> {
        let rows: Vec<AgentRow> = sqlx::query_as(
            r#"
            SELECT
                a.id AS agent_id, a.organisation_id, a.created_at AS agent_created_at,
                u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
                u.role, u.is_active, u.last_login, u.created_at, u.modified_at, u.removed_at
            FROM agents a
            JOIN users u ON u.id = a.user_id
            WHERE a.organisation_id = $1 AND u.removed_at IS NULL
            ORDER BY a.created_at
            "#
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("listing agents"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find(&self, organisation_id: &Uuid, id: &Uuid) -> Result<Option<AgentProfile>, DomainError> {
        let row: Option<AgentRow> = sqlx::query_as(
            r#"
            SELECT
                a.id AS agent_id, a.organisation_id, a.created_at AS agent_created_at,
                u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
                u.role, u.is_active, u.last_login, u.created_at, u.modified_at, u.removed_at
            FROM agents a
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1 AND a.organisation_id = $2 AND u.removed_at IS NULL
            "#
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding agent"))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_user(&self, user_id: &Uuid) -> Result<Option<AgentProfile>, DomainError> {
        let row: Option<AgentRow> = sqlx::query_as(
            r#"
            SELECT
                a.id AS agent_id, a.organisation_id, a.created_at AS agent_created_at,
                u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
                u.role, u.is_active, u.last_login, u.created_at, u.modified_at, u.removed_at
            FROM agents a
            JOIN users u ON u.id = a.user_id
            WHERE a.user_id = $1 AND u.removed_at IS NULL
            "#
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding agent by user"))?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, agent: &AgentProfile) -> Result<AgentProfile, DomainError> {
        info!("Creating agent {} in organisation {}", agent.user.username, agent.organisation_id);

        let mut tx = self.pool.begin().await.map_err(db_error("starting agent creation"))?;

        let user_row = insert_user(&mut tx, &agent.user).await?;
        let (id, organisation_id, created_at): (Uuid, Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO agents (id, organisation_id, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organisation_id, created_at
            "#
        )
        .bind(agent.id)
        .bind(agent.organisation_id)
        .bind(user_row.id)
        .bind(agent.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("creating agent"))?;

        tx.commit().await.map_err(db_error("committing agent creation"))?;

        Ok(AgentRow {
            agent_id: id,
            organisation_id,
            agent_created_at: created_at,
            user: user_row,
        }
        .into())
    }

    async fn update(&self, agent: &AgentProfile) -> Result<AgentProfile, DomainError> {
        let row: Option<AgentRow> = sqlx::query_as(
            r#"
            UPDATE users u
            SET
                username = $3,
                email = $4,
                first_name = $5,
                last_name = $6,
                modified_at = $7
            FROM agents a
            WHERE a.id = $1 AND a.organisation_id = $2 AND u.id = a.user_id
            RETURNING
                a.id AS agent_id, a.organisation_id, a.created_at AS agent_created_at,
                u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
                u.role, u.is_active, u.last_login, u.created_at, u.modified_at, u.removed_at
            "#
        )
        .bind(agent.id)
        .bind(agent.organisation_id)
        .bind(&agent.user.username)
        .bind(&agent.user.email)
        .bind(&agent.user.first_name)
        .bind(&agent.user.last_name)
        .bind(agent.user.modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error("updating agent"))?;

        row.map(Into::into).ok_or(DomainError::NotFound("Agent"))
    }

    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("starting agent removal"))?;

        // leads.agent_id is cleared by ON DELETE SET NULL
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM agents WHERE id = $1 AND organisation_id = $2 RETURNING user_id",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("deleting agent"))?;

        let Some(user_id) = user_id else {
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE users
            SET removed_at = NOW(), modified_at = NOW(), is_active = false
            WHERE id = $1
            "#
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("removing agent user"))?;

        sqlx::query("UPDATE user_sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("revoking agent sessions"))?;

        tx.commit().await.map_err(db_error("committing agent removal"))?;

        info!("Agent {} removed from organisation {}", id, organisation_id);
        Ok(true)
    }
}
