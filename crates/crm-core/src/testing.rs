//! In-memory adapters for tests
//!
//! `InMemoryStore` implements every repository port over a single locked
//! state, and `RecordingNotifier` keeps the notifications it was asked to
//! send. Enabled for this crate's tests and, through the `test-support`
//! feature, for dependent crates.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crm_security::PasswordService;

use crate::access::LeadFilter;
use crate::domain::{AgentProfile, Category, Lead, LeadFields, Organisation, User, UserRole, UserSession};
use crate::error::DomainError;
use crate::notifier::{Notification, Notifier};
use crate::repositories::{
    AgentRepository, CategoryRepository, LeadRepository, OrganisationRepository, Repositories,
    SessionRepository, UserRepository,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    organisations: HashMap<Uuid, Organisation>,
    agents: HashMap<Uuid, AgentProfile>,
    leads: HashMap<Uuid, Lead>,
    categories: HashMap<Uuid, Category>,
    sessions: HashMap<Uuid, UserSession>,
}

impl State {
    /// Agent profile with its user refreshed from the user table.
    fn agent(&self, profile: &AgentProfile) -> Option<AgentProfile> {
        let user = self.users.get(&profile.user.id)?;
        if user.is_deleted() {
            return None;
        }
        let mut profile = profile.clone();
        profile.user = user.clone();
        Some(profile)
    }

    fn live_user(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .values()
            .find(|u| !u.is_deleted() && predicate(u))
            .cloned()
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            organisations: self.clone(),
            agents: self.clone(),
            leads: self.clone(),
            categories: self.clone(),
            sessions: self.clone(),
        }
    }

    pub fn seed_organisor(&self, username: &str, password: &str) -> (User, Organisation) {
        let hash = PasswordService::hash(password).expect("hash password");
        let user = User::new(
            username,
            &format!("{}@example.com", username),
            "",
            "",
            hash,
            UserRole::Organisor,
        )
        .expect("valid organisor");
        let organisation = Organisation::for_owner(&user).expect("valid organisation");

        let mut state = self.state.lock();
        state.users.insert(user.id, user.clone());
        state.organisations.insert(organisation.id, organisation.clone());
        (user, organisation)
    }

    pub fn seed_agent(&self, organisation_id: Uuid, username: &str, password: &str) -> AgentProfile {
        let hash = PasswordService::hash(password).expect("hash password");
        let user = User::new(
            username,
            &format!("{}@example.com", username),
            "Agent",
            username,
            hash,
            UserRole::Agent,
        )
        .expect("valid agent");
        let profile = AgentProfile::new(organisation_id, user).expect("agent profile");

        let mut state = self.state.lock();
        state.users.insert(profile.user.id, profile.user.clone());
        state.agents.insert(profile.id, profile.clone());
        profile
    }

    pub fn seed_category(&self, organisation_id: Uuid, name: &str) -> Category {
        let category = Category::new(organisation_id, name).expect("valid category");
        self.state.lock().categories.insert(category.id, category.clone());
        category
    }

    pub fn seed_lead(
        &self,
        organisation_id: Uuid,
        agent_id: Option<Uuid>,
        category_id: Option<Uuid>,
    ) -> Lead {
        let lead = Lead::new(
            organisation_id,
            LeadFields {
                first_name: "Joe".to_string(),
                last_name: "Soap".to_string(),
                age: 40,
                email: "joe.soap@example.com".to_string(),
                agent_id,
                category_id,
                ..Default::default()
            },
        )
        .expect("valid lead");
        self.state.lock().leads.insert(lead.id, lead.clone());
        lead
    }

    pub fn user(&self, id: &Uuid) -> Option<User> {
        self.state.lock().users.get(id).cloned()
    }

    pub fn lead(&self, id: &Uuid) -> Option<Lead> {
        self.state.lock().leads.get(id).cloned()
    }

    pub fn sessions_for(&self, user_id: &Uuid) -> Vec<UserSession> {
        self.state
            .lock()
            .sessions
            .values()
            .filter(|s| s.user_id == *user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.state.lock().live_user(|u| u.id == *id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .state
            .lock()
            .live_user(|u| u.username.eq_ignore_ascii_case(username.trim())))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .state
            .lock()
            .live_user(|u| u.email.eq_ignore_ascii_case(email.trim())))
    }

    async fn create_organisor(
        &self,
        user: &User,
        organisation: &Organisation,
    ) -> Result<(User, Organisation), DomainError> {
        let mut state = self.state.lock();
        state.users.insert(user.id, user.clone());
        state.organisations.insert(organisation.id, organisation.clone());
        Ok((user.clone(), organisation.clone()))
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut state = self.state.lock();
        match state.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(user.clone())
            }
            None => Err(DomainError::NotFound("User")),
        }
    }

    async fn record_login(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(user) = self.state.lock().users.get_mut(id) {
            if user.removed_at.is_none() {
                user.last_login = Some(at);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrganisationRepository for InMemoryStore {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organisation>, DomainError> {
        Ok(self.state.lock().organisations.get(id).cloned())
    }

    async fn find_by_owner(&self, owner_id: &Uuid) -> Result<Option<Organisation>, DomainError> {
        Ok(self
            .state
            .lock()
            .organisations
            .values()
            .find(|o| o.owner_id == *owner_id)
            .cloned())
    }
}

#[async_trait]
impl AgentRepository for InMemoryStore {
    async fn list(&self, organisation_id: &Uuid) -> Result<Vec<AgentProfile>, DomainError> {
        let state = self.state.lock();
        let mut agents: Vec<AgentProfile> = state
            .agents
            .values()
            .filter(|a| a.organisation_id == *organisation_id)
            .filter_map(|a| state.agent(a))
            .collect();
        agents.sort_by_key(|a| a.created_at);
        Ok(agents)
    }

    async fn find(&self, organisation_id: &Uuid, id: &Uuid) -> Result<Option<AgentProfile>, DomainError> {
        let state = self.state.lock();
        Ok(state
            .agents
            .get(id)
            .filter(|a| a.organisation_id == *organisation_id)
            .and_then(|a| state.agent(a)))
    }

    async fn find_by_user(&self, user_id: &Uuid) -> Result<Option<AgentProfile>, DomainError> {
        let state = self.state.lock();
        Ok(state
            .agents
            .values()
            .find(|a| a.user.id == *user_id)
            .and_then(|a| state.agent(a)))
    }

    async fn create(&self, agent: &AgentProfile) -> Result<AgentProfile, DomainError> {
        let mut state = self.state.lock();
        state.users.insert(agent.user.id, agent.user.clone());
        state.agents.insert(agent.id, agent.clone());
        Ok(agent.clone())
    }

    async fn update(&self, agent: &AgentProfile) -> Result<AgentProfile, DomainError> {
        let mut state = self.state.lock();
        let known = state
            .agents
            .get(&agent.id)
            .is_some_and(|a| a.organisation_id == agent.organisation_id);
        if !known {
            return Err(DomainError::NotFound("Agent"));
        }
        state.users.insert(agent.user.id, agent.user.clone());
        state.agents.insert(agent.id, agent.clone());
        Ok(agent.clone())
    }

    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock();
        let matches = state
            .agents
            .get(id)
            .is_some_and(|a| a.organisation_id == *organisation_id);
        if !matches {
            return Ok(false);
        }
        let Some(profile) = state.agents.remove(id) else {
            return Ok(false);
        };

        for lead in state.leads.values_mut().filter(|l| l.agent_id == Some(*id)) {
            lead.agent_id = None;
        }
        if let Some(user) = state.users.get_mut(&profile.user.id) {
            user.soft_delete();
        }
        for session in state.sessions.values_mut().filter(|s| s.user_id == profile.user.id) {
            session.revoke();
        }
        Ok(true)
    }
}

#[async_trait]
impl LeadRepository for InMemoryStore {
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<Lead>, DomainError> {
        let mut leads: Vec<Lead> = self
            .state
            .lock()
            .leads
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        leads.sort_by_key(|l| l.date_added);
        Ok(leads)
    }

    async fn count(&self, filter: &LeadFilter) -> Result<i64, DomainError> {
        let count = self.state.lock().leads.values().filter(|l| filter.matches(l)).count();
        Ok(count as i64)
    }

    async fn find(&self, filter: &LeadFilter, id: &Uuid) -> Result<Option<Lead>, DomainError> {
        Ok(self
            .state
            .lock()
            .leads
            .get(id)
            .filter(|l| filter.matches(l))
            .cloned())
    }

    async fn create(&self, lead: &Lead) -> Result<Lead, DomainError> {
        self.state.lock().leads.insert(lead.id, lead.clone());
        Ok(lead.clone())
    }

    async fn update(&self, lead: &Lead) -> Result<Lead, DomainError> {
        let mut state = self.state.lock();
        match state.leads.get_mut(&lead.id) {
            Some(existing) if existing.organisation_id == lead.organisation_id => {
                *existing = lead.clone();
                Ok(lead.clone())
            }
            _ => Err(DomainError::NotFound("Lead")),
        }
    }

    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock();
        let matches = state
            .leads
            .get(id)
            .is_some_and(|l| l.organisation_id == *organisation_id);
        if matches {
            state.leads.remove(id);
        }
        Ok(matches)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn list(&self, organisation_id: &Uuid) -> Result<Vec<Category>, DomainError> {
        let mut categories: Vec<Category> = self
            .state
            .lock()
            .categories
            .values()
            .filter(|c| c.organisation_id == *organisation_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find(&self, organisation_id: &Uuid, id: &Uuid) -> Result<Option<Category>, DomainError> {
        Ok(self
            .state
            .lock()
            .categories
            .get(id)
            .filter(|c| c.organisation_id == *organisation_id)
            .cloned())
    }

    async fn find_by_name(&self, organisation_id: &Uuid, name: &str) -> Result<Option<Category>, DomainError> {
        Ok(self
            .state
            .lock()
            .categories
            .values()
            .find(|c| c.organisation_id == *organisation_id && c.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn create(&self, category: &Category) -> Result<Category, DomainError> {
        self.state.lock().categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn update(&self, category: &Category) -> Result<Category, DomainError> {
        let mut state = self.state.lock();
        match state.categories.get_mut(&category.id) {
            Some(existing) if existing.organisation_id == category.organisation_id => {
                *existing = category.clone();
                Ok(category.clone())
            }
            _ => Err(DomainError::NotFound("Category")),
        }
    }

    async fn delete(&self, organisation_id: &Uuid, id: &Uuid) -> Result<bool, DomainError> {
        let mut state = self.state.lock();
        let matches = state
            .categories
            .get(id)
            .is_some_and(|c| c.organisation_id == *organisation_id);
        if !matches {
            return Ok(false);
        }
        state.categories.remove(id);
        for lead in state.leads.values_mut().filter(|l| l.category_id == Some(*id)) {
            lead.category_id = None;
        }
        Ok(true)
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn create(&self, session: &UserSession) -> Result<UserSession, DomainError> {
        self.state.lock().sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn find_active(&self, id: &Uuid, now: DateTime<Utc>) -> Result<Option<UserSession>, DomainError> {
        Ok(self
            .state
            .lock()
            .sessions
            .get(id)
            .filter(|s| s.is_active_at(now))
            .cloned())
    }

    async fn revoke(&self, id: &Uuid) -> Result<(), DomainError> {
        if let Some(session) = self.state.lock().sessions.get_mut(id) {
            session.revoke();
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: &Uuid) -> Result<(), DomainError> {
        for session in self
            .state
            .lock()
            .sessions
            .values_mut()
            .filter(|s| s.user_id == *user_id)
        {
            session.revoke();
        }
        Ok(())
    }
}

/// Notifier that records instead of sending.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), DomainError> {
        self.sent.lock().push(notification);
        Ok(())
    }
}
