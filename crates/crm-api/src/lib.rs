//! # CRM API
//! 
//! HTTP handlers, DTOs, authentication extractor, and router.

pub mod handlers;
pub mod dto;
pub mod error;
pub mod extractor;
pub mod response;
pub mod routes;
pub mod state;
pub mod throttle;

pub use routes::build_router;
pub use state::{ApiSettings, AppState};
