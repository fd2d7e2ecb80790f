//! PostgreSQL session repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crm_core::domain::UserSession;
use crm_core::error::DomainError;
use crm_core::repositories::SessionRepository;

use super::db_error;

pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for UserSession {
    fn from(row: SessionRow) -> Self {
        UserSession {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &UserSession) -> Result<UserSession, DomainError> {
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO user_sessions (id, user_id, created_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, created_at, expires_at, revoked_at
            "#
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.revoked_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("creating session"))?;

        Ok(row.into())
    }

    async fn find_active(&self, id: &Uuid, now: DateTime<Utc>) -> Result<Option<UserSession>, DomainError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, created_at, expires_at, revoked_at
            FROM user_sessions
            WHERE id = $1 AND revoked_at IS NULL AND expires_at > $2
            "#
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding session"))?;

        Ok(row.map(Into::into))
    }

    async fn revoke(&self, id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE user_sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("revoking session"))?;
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &Uuid) -> Result<(), DomainError> {
        sqlx::query("UPDATE user_sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("revoking user sessions"))?;
        Ok(())
    }
}
