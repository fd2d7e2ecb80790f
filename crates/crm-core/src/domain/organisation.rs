//! Organisation domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::User;

/// Owned by exactly one organisor; scopes every agent, lead and category.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Organisation {
    pub id: Uuid,
    pub owner_id: Uuid,

    #[validate(length(min = 1, max = 150, message = "Organisation name must be between 1 and 150 characters"))]
    pub name: String,

    pub created_at: DateTime<Utc>,
}

impl Organisation {
    /// Profile created alongside an organisor at signup, named after them.
    pub fn for_owner(owner: &User) -> Result<Self, validator::ValidationErrors> {
        let organisation = Self {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            name: owner.username.clone(),
            created_at: Utc::now(),
        };

        organisation.validate()?;
        Ok(organisation)
    }
}
