//! # CRM Security
//! 
//! Security utilities: access tokens, password hashing, password-reset tokens.

pub mod jwt;
pub mod password;
pub mod reset_token;

pub use jwt::{Claims, JwtService};
pub use password::PasswordService;
pub use reset_token::ResetTokenGenerator;
