// ============================================================================
// CRM Infrastructure - PostgreSQL User Repository
// File: crates/crm-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crm_core::domain::{Organisation, User, UserRole};
use crm_core::error::DomainError;
use crm_core::repositories::UserRepository;

use super::{db_error, write_error};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            // the column is CHECK-constrained; fall back to the narrower role
            role: UserRole::from_str(&row.role).unwrap_or(UserRole::Agent),
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct OrganisationRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<OrganisationRow> for Organisation {
    fn from(row: OrganisationRow) -> Self {
        Organisation {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Inserts a user inside an open transaction.
pub(crate) async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    user: &User,
) -> Result<UserRow, DomainError> {
    sqlx::query_as(
        r#"
        INSERT INTO users (
            id, username, email, first_name, last_name, password_hash,
            role, is_active, last_login, created_at, modified_at, removed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING
            id, username, email, first_name, last_name, password_hash,
            role, is_active, last_login, created_at, modified_at, removed_at
        "#
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(user.is_active)
    .bind(user.last_login)
    .bind(user.created_at)
    .bind(user.modified_at)
    .bind(user.removed_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(write_error("creating user"))
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT
                id, username, email, first_name, last_name, password_hash,
                role, is_active, last_login, created_at, modified_at, removed_at
            FROM users
            WHERE id = $1 AND removed_at IS NULL
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT
                id, username, email, first_name, last_name, password_hash,
                role, is_active, last_login, created_at, modified_at, removed_at
            FROM users
            WHERE LOWER(username) = LOWER($1) AND removed_at IS NULL
            "#
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user by username"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT
                id, username, email, first_name, last_name, password_hash,
                role, is_active, last_login, created_at, modified_at, removed_at
            FROM users
            WHERE LOWER(email) = LOWER($1) AND removed_at IS NULL
            "#
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("finding user by email"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn create_organisor(
        &self,
        user: &User,
        organisation: &Organisation,
    ) -> Result<(User, Organisation), DomainError> {
        info!("Creating organisor: {}", user.username);

        let mut tx = self.pool.begin().await.map_err(db_error("starting signup"))?;

        let user_row = insert_user(&mut tx, user).await?;
        let organisation_row: OrganisationRow = sqlx::query_as(
            r#"
            INSERT INTO organisations (id, owner_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, name, created_at
            "#
        )
        .bind(organisation.id)
        .bind(organisation.owner_id)
        .bind(&organisation.name)
        .bind(organisation.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error("creating organisation"))?;

        tx.commit().await.map_err(db_error("committing signup"))?;

        info!("Organisor created successfully: {}", user_row.id);
        Ok((user_row.into(), organisation_row.into()))
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users
            SET
                username = $2,
                email = $3,
                first_name = $4,
                last_name = $5,
                password_hash = $6,
                is_active = $7,
                last_login = $8,
                modified_at = $9,
                removed_at = $10
            WHERE id = $1
            RETURNING
                id, username, email, first_name, last_name, password_hash,
                role, is_active, last_login, created_at, modified_at, removed_at
            "#
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.last_login)
        .bind(user.modified_at)
        .bind(user.removed_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error("updating user"))?;

        row.map(|r| r.into()).ok_or(DomainError::NotFound("User"))
    }

    async fn record_login(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1 AND removed_at IS NULL")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error("recording login"))?;
        Ok(())
    }
}
