//! PostgreSQL repository implementations

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{error, warn};

use crm_core::error::DomainError;
use crm_core::repositories::Repositories;

pub mod user_repo_impl;
pub mod organisation_repo_impl;
pub mod agent_repo_impl;
pub mod lead_repo_impl;
pub mod category_repo_impl;
pub mod session_repo_impl;

pub use user_repo_impl::PgUserRepository;
pub use organisation_repo_impl::PgOrganisationRepository;
pub use agent_repo_impl::PgAgentRepository;
pub use lead_repo_impl::PgLeadRepository;
pub use category_repo_impl::PgCategoryRepository;
pub use session_repo_impl::PgSessionRepository;

/// Every repository port backed by the same pool.
pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        organisations: Arc::new(PgOrganisationRepository::new(pool.clone())),
        agents: Arc::new(PgAgentRepository::new(pool.clone())),
        leads: Arc::new(PgLeadRepository::new(pool.clone())),
        categories: Arc::new(PgCategoryRepository::new(pool.clone())),
        sessions: Arc::new(PgSessionRepository::new(pool)),
    }
}

/// Logs and wraps a database error.
pub(crate) fn db_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        error!("Database error {}: {}", action, e);
        DomainError::DatabaseError(e.to_string())
    }
}

/// Like [`db_error`], but unique violations become a form error on the
/// column the violated index covers.
pub(crate) fn write_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                let field = match db.constraint() {
                    Some(c) if c.contains("username") => "username",
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.contains("name") => "name",
                    _ => "__all__",
                };
                warn!("Unique violation {}: {}", action, db.message());
                return DomainError::field(field, "This value is already in use.");
            }
        }
        db_error(action)(e)
    }
}
