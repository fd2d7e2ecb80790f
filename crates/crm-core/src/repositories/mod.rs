//! Repository traits (ports)

use std::sync::Arc;

pub mod user_repository;
pub mod organisation_repository;
pub mod agent_repository;
pub mod lead_repository;
pub mod category_repository;
pub mod session_repository;

pub use user_repository::UserRepository;
pub use organisation_repository::OrganisationRepository;
pub use agent_repository::AgentRepository;
pub use lead_repository::LeadRepository;
pub use category_repository::CategoryRepository;
pub use session_repository::SessionRepository;

/// One handle per port, shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub organisations: Arc<dyn OrganisationRepository>,
    pub agents: Arc<dyn AgentRepository>,
    pub leads: Arc<dyn LeadRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub sessions: Arc<dyn SessionRepository>,
}
