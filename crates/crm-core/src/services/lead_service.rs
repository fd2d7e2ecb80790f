// ============================================================================
// CRM Core - Lead Service
// File: crates/crm-core/src/services/lead_service.rs
// ============================================================================
//! Lead CRUD, assignment and categorisation
//!
//! Reads go through the caller's lead scope; writes other than setting the
//! category are reserved to organisors.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::access::{LeadFilter, Principal};
use crate::domain::{Lead, LeadFields};
use crate::error::{DomainError, FieldErrors};
use crate::notifier::{deliver, Notification, Notifier};
use crate::repositories::Repositories;

/// Lead list as seen by the caller. `unassigned_leads` is only present for
/// organisors.
#[derive(Debug, Clone, Serialize)]
pub struct LeadListing {
    pub leads: Vec<Lead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unassigned_leads: Option<Vec<Lead>>,
}

pub struct LeadService {
    repos: Repositories,
    notifier: Arc<dyn Notifier>,
    notification_recipients: Vec<String>,
}

impl LeadService {
    pub fn new(repos: Repositories, notifier: Arc<dyn Notifier>, notification_recipients: Vec<String>) -> Self {
        Self {
            repos,
            notifier,
            notification_recipients,
        }
    }

    pub async fn list(&self, principal: &Principal) -> Result<LeadListing, DomainError> {
        let filter = LeadFilter::for_scope(principal.lead_scope());

        if principal.is_organisor() {
            let leads = self.repos.leads.list(&filter.assigned()).await?;
            let unassigned = self.repos.leads.list(&filter.unassigned()).await?;
            Ok(LeadListing {
                leads,
                unassigned_leads: Some(unassigned),
            })
        } else {
            Ok(LeadListing {
                leads: self.repos.leads.list(&filter).await?,
                unassigned_leads: None,
            })
        }
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<Lead, DomainError> {
        let filter = LeadFilter::for_scope(principal.lead_scope());
        self.repos
            .leads
            .find(&filter, id)
            .await?
            .ok_or(DomainError::NotFound("Lead"))
    }

    pub async fn create(&self, principal: &Principal, fields: LeadFields) -> Result<Lead, DomainError> {
        let organisation_id = principal.require_organisor()?;

        let references = self.check_references(&organisation_id, &fields).await?;
        let lead = Lead::new(organisation_id, fields).map_err(|e| {
            let mut errors = FieldErrors::from(e);
            errors.merge(references.clone());
            DomainError::Validation(errors)
        })?;
        references.into_result()?;

        let lead = self.repos.leads.create(&lead).await?;
        info!(lead_id = %lead.id, organisation_id = %organisation_id, "Lead created");

        let organisation_name = self
            .repos
            .organisations
            .find_by_id(&organisation_id)
            .await?
            .map(|o| o.name)
            .unwrap_or_else(|| principal.username.clone());
        let to = if self.notification_recipients.is_empty() {
            vec![principal.email.clone()]
        } else {
            self.notification_recipients.clone()
        };

        deliver(
            self.notifier.as_ref(),
            Notification::LeadCreated {
                to,
                lead_name: lead.full_name(),
                organisation_name,
            },
        )
        .await;

        Ok(lead)
    }

    pub async fn update(&self, principal: &Principal, id: &Uuid, fields: LeadFields) -> Result<Lead, DomainError> {
        let organisation_id = principal.require_organisor()?;
        let mut lead = self.get(principal, id).await?;

        let references = self.check_references(&organisation_id, &fields).await?;
        if let Err(e) = lead.apply(fields) {
            let mut errors = FieldErrors::from(e);
            errors.merge(references);
            return Err(DomainError::Validation(errors));
        }
        references.into_result()?;

        let lead = self.repos.leads.update(&lead).await?;
        info!(lead_id = %lead.id, "Lead updated");
        Ok(lead)
    }

    pub async fn delete(&self, principal: &Principal, id: &Uuid) -> Result<(), DomainError> {
        let organisation_id = principal.require_organisor()?;
        if !self.repos.leads.delete(&organisation_id, id).await? {
            return Err(DomainError::NotFound("Lead"));
        }
        info!(lead_id = %id, "Lead deleted");
        Ok(())
    }

    /// Assigns the lead to an agent of the same organisation.
    pub async fn assign_agent(&self, principal: &Principal, id: &Uuid, agent_id: &Uuid) -> Result<Lead, DomainError> {
        let organisation_id = principal.require_organisor()?;
        let mut lead = self.get(principal, id).await?;

        let agent = self
            .repos
            .agents
            .find(&organisation_id, agent_id)
            .await?
            .ok_or_else(|| DomainError::field("agent_id", "Select a valid choice. That choice is not one of the available choices."))?;

        lead.assign_agent(agent.id);
        let lead = self.repos.leads.update(&lead).await?;
        info!(lead_id = %lead.id, agent_id = %agent.id, "Lead assigned");
        Ok(lead)
    }

    /// Organisors may categorise any lead of theirs, agents only their own.
    pub async fn update_category(
        &self,
        principal: &Principal,
        id: &Uuid,
        category_id: Option<Uuid>,
    ) -> Result<Lead, DomainError> {
        let mut lead = self.get(principal, id).await?;

        if let Some(category_id) = category_id {
            self.repos
                .categories
                .find(&principal.organisation_id, &category_id)
                .await?
                .ok_or_else(|| DomainError::field("category_id", "Select a valid choice. That choice is not one of the available choices."))?;
        }

        lead.set_category(category_id);
        let lead = self.repos.leads.update(&lead).await?;
        info!(lead_id = %lead.id, "Lead category updated");
        Ok(lead)
    }

    /// Agent and category must belong to the lead's organisation.
    async fn check_references(&self, organisation_id: &Uuid, fields: &LeadFields) -> Result<FieldErrors, DomainError> {
        let mut errors = FieldErrors::new();
        if let Some(agent_id) = &fields.agent_id {
            if self.repos.agents.find(organisation_id, agent_id).await?.is_none() {
                errors.add("agent_id", "Select a valid choice. That choice is not one of the available choices.");
            }
        }
        if let Some(category_id) = &fields.category_id {
            if self.repos.categories.find(organisation_id, category_id).await?.is_none() {
                errors.add("category_id", "Select a valid choice. That choice is not one of the available choices.");
            }
        }
        Ok(errors)
    }
}
