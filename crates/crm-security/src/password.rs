//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distr::Alphanumeric, Rng};
use thiserror::Error;

use crm_shared::constants::{GENERATED_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
}

/// Reasons a candidate password is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    TooShort,
    TooLong,
    EntirelyNumeric,
    TooSimilarToUsername,
}

impl PasswordRule {
    pub fn message(&self) -> String {
        match self {
            PasswordRule::TooShort => format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
            PasswordRule::TooLong => format!(
                "This password is too long. It must contain at most {} characters.",
                MAX_PASSWORD_LENGTH
            ),
            PasswordRule::EntirelyNumeric => "This password is entirely numeric.".to_string(),
            PasswordRule::TooSimilarToUsername => {
                "The password is too similar to the username.".to_string()
            }
        }
    }
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Random alphanumeric password for accounts created on someone's behalf.
    pub fn generate() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSWORD_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Returns every rule the password breaks; empty means acceptable.
    pub fn check_strength(password: &str, username: &str) -> Vec<PasswordRule> {
        let mut broken = Vec::new();
        let length = password.chars().count();

        if length < MIN_PASSWORD_LENGTH {
            broken.push(PasswordRule::TooShort);
        }
        if length > MAX_PASSWORD_LENGTH {
            broken.push(PasswordRule::TooLong);
        }
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            broken.push(PasswordRule::EntirelyNumeric);
        }

        let lowered = password.to_lowercase();
        let username = username.trim().to_lowercase();
        let similar = lowered.contains(&username) || (lowered.chars().count() >= 3 && username.contains(&lowered));
        if username.chars().count() >= 3 && similar {
            broken.push(PasswordRule::TooSimilarToUsername);
        }

        broken
    }
}
