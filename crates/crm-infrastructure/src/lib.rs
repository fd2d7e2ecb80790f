//! # CRM Infrastructure
//! 
//! Database and e-mail implementations (adapters).

pub mod database;
pub mod mail;

pub use database::{create_pool, postgres_repositories, run_migrations};
pub use mail::{ConsoleNotifier, MailRenderer, SmtpNotifier};
