//! Domain services (business logic)

pub mod auth_service;
pub mod password_reset_service;
pub mod agent_service;
pub mod lead_service;
pub mod category_service;

pub use auth_service::{AuthService, LoginResult, SignupCommand, UserInfo};
pub use password_reset_service::{PasswordResetService, SetPasswordCommand};
pub use agent_service::{AgentCommand, AgentService};
pub use lead_service::{LeadListing, LeadService};
pub use category_service::{CategoryDetail, CategoryListing, CategoryService};

use crm_security::PasswordService;

use crate::error::FieldErrors;

/// Strength rules as form errors on `field`.
pub(crate) fn password_rule_errors(field: &str, password: &str, username: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for rule in PasswordService::check_strength(password, username) {
        errors.add(field, rule.message());
    }
    errors
}
