// ============================================================================
// CRM Core - Access Scoping
// File: crates/crm-core/src/access.rs
// Description: Authenticated caller and the organisation scope of its queries
// ============================================================================
//! Every lead query goes through a [`LeadFilter`], and a filter can only be
//! built from the caller's [`Scope`]. Organisors see their whole
//! organisation; agents see the leads assigned to them.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AgentProfile, Lead, Organisation, User, UserRole};
use crate::error::DomainError;

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub organisation_id: Uuid,
    pub agent_id: Option<Uuid>,
    pub session_id: Uuid,
}

impl Principal {
    pub fn organisor(user: &User, organisation: &Organisation, session_id: Uuid) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: UserRole::Organisor,
            organisation_id: organisation.id,
            agent_id: None,
            session_id,
        }
    }

    pub fn agent(profile: &AgentProfile, session_id: Uuid) -> Self {
        Self {
            user_id: profile.user.id,
            username: profile.user.username.clone(),
            email: profile.user.email.clone(),
            role: UserRole::Agent,
            organisation_id: profile.organisation_id,
            agent_id: Some(profile.id),
            session_id,
        }
    }

    pub fn is_organisor(&self) -> bool {
        self.role == UserRole::Organisor
    }

    /// Organisation id of an organisor caller, `Forbidden` for agents.
    pub fn require_organisor(&self) -> Result<Uuid, DomainError> {
        if self.is_organisor() {
            Ok(self.organisation_id)
        } else {
            tracing::warn!(user_id = %self.user_id, "agent attempted an organisor-only operation");
            Err(DomainError::Forbidden("organisor access required".to_string()))
        }
    }

    pub fn lead_scope(&self) -> Scope {
        match (self.role, self.agent_id) {
            (UserRole::Agent, Some(agent_id)) => Scope::AgentLeads {
                organisation_id: self.organisation_id,
                agent_id,
            },
            _ => Scope::Organisation { organisation_id: self.organisation_id },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Organisation { organisation_id: Uuid },
    AgentLeads { organisation_id: Uuid, agent_id: Uuid },
}

impl Scope {
    pub fn organisation_id(&self) -> Uuid {
        match self {
            Scope::Organisation { organisation_id } => *organisation_id,
            Scope::AgentLeads { organisation_id, .. } => *organisation_id,
        }
    }

    pub fn agent_id(&self) -> Option<Uuid> {
        match self {
            Scope::Organisation { .. } => None,
            Scope::AgentLeads { agent_id, .. } => Some(*agent_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Any,
    Assigned,
    Unassigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryMatch {
    Any,
    Uncategorized,
    Category(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadFilter {
    scope: Scope,
    assignment: Assignment,
    category: CategoryMatch,
}

impl LeadFilter {
    pub fn for_scope(scope: Scope) -> Self {
        Self {
            scope,
            assignment: Assignment::Any,
            category: CategoryMatch::Any,
        }
    }

    pub fn assigned(mut self) -> Self {
        self.assignment = Assignment::Assigned;
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.assignment = Assignment::Unassigned;
        self
    }

    pub fn uncategorized(mut self) -> Self {
        self.category = CategoryMatch::Uncategorized;
        self
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category = CategoryMatch::Category(category_id);
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn organisation_id(&self) -> Uuid {
        self.scope.organisation_id()
    }

    pub fn agent_id(&self) -> Option<Uuid> {
        self.scope.agent_id()
    }

    pub fn assignment(&self) -> Assignment {
        self.assignment
    }

    pub fn category(&self) -> CategoryMatch {
        self.category
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        if lead.organisation_id != self.organisation_id() {
            return false;
        }
        if let Some(agent_id) = self.agent_id() {
            if lead.agent_id != Some(agent_id) {
                return false;
            }
        }
        let assignment_ok = match self.assignment {
            Assignment::Any => true,
            Assignment::Assigned => lead.agent_id.is_some(),
            Assignment::Unassigned => lead.agent_id.is_none(),
        };
        let category_ok = match self.category {
            CategoryMatch::Any => true,
            CategoryMatch::Uncategorized => lead.category_id.is_none(),
            CategoryMatch::Category(id) => lead.category_id == Some(id),
        };
        assignment_ok && category_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LeadFields;

    fn lead(organisation_id: Uuid, agent_id: Option<Uuid>, category_id: Option<Uuid>) -> Lead {
        Lead::new(
            organisation_id,
            LeadFields {
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
                age: 30,
                email: "ann@example.com".to_string(),
                agent_id,
                category_id,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn principal(role: UserRole, organisation_id: Uuid, agent_id: Option<Uuid>) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            username: "caller".to_string(),
            email: "caller@example.com".to_string(),
            role,
            organisation_id,
            agent_id,
            session_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_organisor_scope_covers_whole_organisation() {
        let org = Uuid::new_v4();
        let filter = LeadFilter::for_scope(principal(UserRole::Organisor, org, None).lead_scope());

        assert!(filter.matches(&lead(org, None, None)));
        assert!(filter.matches(&lead(org, Some(Uuid::new_v4()), None)));
        assert!(!filter.matches(&lead(Uuid::new_v4(), None, None)));
    }

    #[test]
    fn test_agent_scope_only_covers_own_leads() {
        let org = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let filter = LeadFilter::for_scope(principal(UserRole::Agent, org, Some(agent)).lead_scope());

        assert!(filter.matches(&lead(org, Some(agent), None)));
        assert!(!filter.matches(&lead(org, Some(Uuid::new_v4()), None)));
        assert!(!filter.matches(&lead(org, None, None)));
        assert!(!filter.matches(&lead(Uuid::new_v4(), Some(agent), None)));
    }

    #[test]
    fn test_narrowing_filters() {
        let org = Uuid::new_v4();
        let category = Uuid::new_v4();
        let base = LeadFilter::for_scope(Scope::Organisation { organisation_id: org });

        let assigned = lead(org, Some(Uuid::new_v4()), Some(category));
        let unassigned = lead(org, None, None);

        assert!(base.assigned().matches(&assigned));
        assert!(!base.assigned().matches(&unassigned));
        assert!(base.unassigned().matches(&unassigned));
        assert!(base.uncategorized().matches(&unassigned));
        assert!(!base.uncategorized().matches(&assigned));
        assert!(base.in_category(category).matches(&assigned));
        assert!(!base.in_category(Uuid::new_v4()).matches(&assigned));
    }

    #[test]
    fn test_require_organisor() {
        let org = Uuid::new_v4();
        assert_eq!(principal(UserRole::Organisor, org, None).require_organisor().unwrap(), org);
        assert!(matches!(
            principal(UserRole::Agent, org, Some(Uuid::new_v4())).require_organisor(),
            Err(DomainError::Forbidden(_))
        ));
    }
}
