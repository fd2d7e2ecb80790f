// ============================================================================
// CRM Core - Lead Entity
// File: crates/crm-core/src/domain/lead.rs
// Description: Prospective customer record owned by an organisation
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Editable lead fields as submitted by an organisor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LeadFields {
    #[validate(length(min = 1, max = 20, message = "First name must be between 1 and 20 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 20, message = "Last name must be between 1 and 20 characters"))]
    pub last_name: String,

    #[validate(range(min = 0, max = 150, message = "Age must be between 0 and 150"))]
    pub age: i32,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description too long"))]
    pub description: String,

    #[serde(default)]
    #[validate(length(max = 20, message = "Phone number too long"))]
    pub phone_number: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub agent_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl LeadFields {
    fn trimmed(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.phone_number = self.phone_number.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    /// Never changes after creation.
    pub organisation_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub age: i32,
    pub description: String,
    pub phone_number: String,
    pub email: String,
    pub date_added: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn new(organisation_id: Uuid, fields: LeadFields) -> Result<Self, validator::ValidationErrors> {
        let fields = fields.trimmed();
        fields.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            organisation_id,
            agent_id: fields.agent_id,
            category_id: fields.category_id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            age: fields.age,
            description: fields.description,
            phone_number: fields.phone_number,
            email: fields.email,
            date_added: Utc::now(),
            modified_at: None,
        })
    }

    /// Overwrites every editable field. The organisation is not editable.
    pub fn apply(&mut self, fields: LeadFields) -> Result<(), validator::ValidationErrors> {
        let fields = fields.trimmed();
        fields.validate()?;

        self.agent_id = fields.agent_id;
        self.category_id = fields.category_id;
        self.first_name = fields.first_name;
        self.last_name = fields.last_name;
        self.age = fields.age;
        self.description = fields.description;
        self.phone_number = fields.phone_number;
        self.email = fields.email;
        self.modified_at = Some(Utc::now());
        Ok(())
    }

    pub fn assign_agent(&mut self, agent_id: Uuid) {
        self.agent_id = Some(agent_id);
        self.modified_at = Some(Utc::now());
    }

    pub fn set_category(&mut self, category_id: Option<Uuid>) {
        self.category_id = category_id;
        self.modified_at = Some(Utc::now());
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
