//! Category domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Category {
    pub id: Uuid,
    pub organisation_id: Uuid,

    #[validate(length(min = 1, max = 30, message = "Category name must be between 1 and 30 characters"))]
    pub name: String,

    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(organisation_id: Uuid, name: &str) -> Result<Self, validator::ValidationErrors> {
        let category = Self {
            id: Uuid::new_v4(),
            organisation_id,
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        category.validate()?;
        Ok(category)
    }

    pub fn rename(&mut self, name: &str) -> Result<(), validator::ValidationErrors> {
        let mut renamed = self.clone();
        renamed.name = name.trim().to_string();
        renamed.validate()?;
        *self = renamed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name_bounds() {
        assert!(Category::new(Uuid::new_v4(), "Contacted").is_ok());
        assert!(Category::new(Uuid::new_v4(), "   ").is_err());
        assert!(Category::new(Uuid::new_v4(), &"x".repeat(31)).is_err());
    }

    #[test]
    fn test_rename_keeps_name_on_failure() {
        let mut category = Category::new(Uuid::new_v4(), "Converted").unwrap();
        assert!(category.rename("").is_err());
        assert_eq!(category.name, "Converted");
        category.rename(" Unconverted ").unwrap();
        assert_eq!(category.name, "Unconverted");
    }
}
