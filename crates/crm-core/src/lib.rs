//! # CRM Core
//! 
//! Domain entities, access scoping, services, and repository traits for the
//! CRM application.

pub mod domain;
pub mod access;
pub mod services;
pub mod repositories;
pub mod notifier;
pub mod error;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export domain entities
pub use domain::*;
pub use access::{LeadFilter, Principal, Scope};
pub use error::{DomainError, FieldErrors};
