//! # CRM Core - Domain Module
//! 
//! Domain entities for the CRM application.

pub mod user;
pub mod organisation;
pub mod agent;
pub mod lead;
pub mod category;
pub mod session;

// Re-export all entities and enums
pub use user::{User, UserRole};
pub use organisation::Organisation;
pub use agent::AgentProfile;
pub use lead::{Lead, LeadFields};
pub use category::Category;
pub use session::UserSession;
