// ============================================================================
// CRM Core - User Entity
// File: crates/crm-core/src/domain/user.rs
// Description: Authentication identity, tagged organisor or agent
// ============================================================================

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crm_shared::utils::normalize_email;

static USERNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid")
});

/// Letters, digits and `@ . + - _` only.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_PATTERN.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.".into(),
        ))
    }
}

/// A user is exactly one of these; the single column makes "both" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Organisor,
    Agent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Organisor => "organisor",
            UserRole::Agent => "agent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "organisor" => Some(UserRole::Organisor),
            "agent" => Some(UserRole::Agent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Uuid,

    #[validate(
        length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    #[validate(length(max = 150, message = "First name too long"))]
    pub first_name: String,

    #[validate(length(max = 150, message = "Last name too long"))]
    pub last_name: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: String,
        role: UserRole,
    ) -> Result<Self, validator::ValidationErrors> {
        let user = Self {
            id: Uuid::new_v4(),
            username: username.trim().to_string(),
            email: normalize_email(email),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            password_hash,
            role,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
            modified_at: None,
            removed_at: None,
        };

        user.validate()?;
        Ok(user)
    }

    pub fn is_organisor(&self) -> bool {
        self.role == UserRole::Organisor
    }

    pub fn is_agent(&self) -> bool {
        self.role == UserRole::Agent
    }

    pub fn can_login(&self) -> bool {
        self.is_active && !self.is_deleted()
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.modified_at = Some(Utc::now());
    }

    /// Replaces the editable profile fields; the user is left untouched when
    /// validation fails.
    pub fn update_profile(
        &mut self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(), validator::ValidationErrors> {
        let mut updated = self.clone();
        updated.username = username.trim().to_string();
        updated.email = normalize_email(email);
        updated.first_name = first_name.trim().to_string();
        updated.last_name = last_name.trim().to_string();
        updated.modified_at = Some(Utc::now());
        updated.validate()?;

        *self = updated;
        Ok(())
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
        self.is_active = false;
    }

    pub fn is_deleted(&self) -> bool {
        self.removed_at.is_some()
    }

    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organisor() -> User {
        User::new("jane.doe", "Jane@Example.COM", "Jane", "Doe", "hash".to_string(), UserRole::Organisor)
            .unwrap()
    }

    #[test]
    fn test_create_user_normalizes_fields() {
        let user = organisor();
        assert_eq!(user.email, "Jane@example.com");
        assert!(user.is_organisor());
        assert!(!user.is_agent());
        assert!(user.can_login());
        assert_eq!(user.full_name(), "Jane Doe");
    }

    #[test]
    fn test_invalid_username_rejected() {
        let result = User::new("bad name!", "a@example.com", "", "", "hash".to_string(), UserRole::Agent);
        let errors = result.unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        let result = User::new("ab", "a@example.com", "", "", "hash".to_string(), UserRole::Agent);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let result = User::new("someone", "not-an-email", "", "", "hash".to_string(), UserRole::Agent);
        assert!(result.unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn test_update_profile_is_all_or_nothing() {
        let mut user = organisor();
        assert!(user.update_profile("jane", "broken", "J", "D").is_err());
        assert_eq!(user.username, "jane.doe");

        user.update_profile("jane", "jane@example.com", "J", "D").unwrap();
        assert_eq!(user.username, "jane");
        assert!(user.modified_at.is_some());
    }

    #[test]
    fn test_soft_delete_blocks_login() {
        let mut user = organisor();
        user.soft_delete();
        assert!(user.is_deleted());
        assert!(!user.can_login());
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        let user = User::new("solo", "solo@example.com", "", "", "hash".to_string(), UserRole::Agent).unwrap();
        assert_eq!(user.full_name(), "solo");
    }

    #[test]
    fn test_role_strings() {
        assert_eq!(UserRole::from_str(UserRole::Agent.as_str()), Some(UserRole::Agent));
        assert_eq!(UserRole::from_str("admin"), None);
    }
}
