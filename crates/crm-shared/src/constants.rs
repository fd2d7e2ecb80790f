//! Application-wide constants

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 28800;
pub const DEFAULT_PASSWORD_RESET_TIMEOUT: i64 = 259200;
pub const DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE: u32 = 10;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const GENERATED_PASSWORD_LENGTH: usize = 16;
