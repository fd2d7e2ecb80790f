//! Agent management for organisors

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crm_security::PasswordService;

use crate::access::Principal;
use crate::domain::{AgentProfile, User, UserRole};
use crate::error::{DomainError, FieldErrors};
use crate::notifier::{deliver, Notification, Notifier};
use crate::repositories::Repositories;

/// Fields an organisor fills in for an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentCommand {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

pub struct AgentService {
    repos: Repositories,
    notifier: Arc<dyn Notifier>,
}

impl AgentService {
    pub fn new(repos: Repositories, notifier: Arc<dyn Notifier>) -> Self {
        Self { repos, notifier }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<AgentProfile>, DomainError> {
        let organisation_id = principal.require_organisor()?;
        self.repos.agents.list(&organisation_id).await
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<AgentProfile, DomainError> {
        let organisation_id = principal.require_organisor()?;
        self.repos
            .agents
            .find(&organisation_id, id)
            .await?
            .ok_or(DomainError::NotFound("Agent"))
    }

    /// Creates the agent account with a random password and mails an invitation.
    pub async fn invite(&self, principal: &Principal, command: AgentCommand) -> Result<AgentProfile, DomainError> {
        let organisation_id = principal.require_organisor()?;

        let taken = self.check_unique(&command, None).await?;

        let password_hash = PasswordService::hash(&PasswordService::generate())
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        let user = User::new(
            &command.username,
            &command.email,
            &command.first_name,
            &command.last_name,
            password_hash,
            UserRole::Agent,
        )
        .map_err(|e| with_field_errors(e, &taken))?;
        taken.into_result()?;
        let agent = AgentProfile::new(organisation_id, user)?;
        let agent = self.repos.agents.create(&agent).await?;

        info!(agent_id = %agent.id, organisation_id = %organisation_id, "Agent created");

        let organisation_name = self
            .repos
            .organisations
            .find_by_id(&organisation_id)
            .await?
            .map(|o| o.name)
            .unwrap_or_else(|| principal.username.clone());

        deliver(
            self.notifier.as_ref(),
            Notification::AgentInvitation {
                to: agent.user.email.clone(),
                username: agent.user.username.clone(),
                organisation_name,
            },
        )
        .await;

        Ok(agent)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &Uuid,
        command: AgentCommand,
    ) -> Result<AgentProfile, DomainError> {
        let mut agent = self.get(principal, id).await?;

        let taken = self.check_unique(&command, Some(&agent.user.id)).await?;
        agent
            .user
            .update_profile(&command.username, &command.email, &command.first_name, &command.last_name)
            .map_err(|e| with_field_errors(e, &taken))?;
        taken.into_result()?;

        let agent = self.repos.agents.update(&agent).await?;
        info!(agent_id = %agent.id, "Agent updated");
        Ok(agent)
    }

    /// Deletes the agent; its leads fall back to unassigned.
    pub async fn remove(&self, principal: &Principal, id: &Uuid) -> Result<(), DomainError> {
        let organisation_id = principal.require_organisor()?;
        if !self.repos.agents.delete(&organisation_id, id).await? {
            return Err(DomainError::NotFound("Agent"));
        }
        info!(agent_id = %id, "Agent removed");
        Ok(())
    }

    async fn check_unique(&self, command: &AgentCommand, current: Option<&Uuid>) -> Result<FieldErrors, DomainError> {
        let mut errors = FieldErrors::new();
        let is_other = |user: &User| Some(&user.id) != current;

        if self.repos.users.find_by_username(&command.username).await?.is_some_and(|u| is_other(&u)) {
            errors.add("username", "A user with that username already exists.");
        }
        if self.repos.users.find_by_email(&command.email).await?.is_some_and(|u| is_other(&u)) {
            errors.add("email", "A user with that email already exists.");
        }
        Ok(errors)
    }
}

/// Field validation failures merged with uniqueness failures.
fn with_field_errors(errors: validator::ValidationErrors, taken: &FieldErrors) -> DomainError {
    let mut fields = FieldErrors::from(errors);
    fields.merge(taken.clone());
    DomainError::Validation(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryStore, RecordingNotifier};
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::{FirstName, LastName};
    use fake::Fake;

    struct Fixture {
        store: Arc<InMemoryStore>,
        notifier: Arc<RecordingNotifier>,
        agents: AgentService,
        boss: Principal,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let notifier = RecordingNotifier::new();
        let (user, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let agents = AgentService::new(store.repositories(), notifier.clone());
        Fixture {
            boss: Principal::organisor(&user, &organisation, Uuid::new_v4()),
            store,
            notifier,
            agents,
        }
    }

    fn command(username: &str) -> AgentCommand {
        AgentCommand {
            username: username.to_string(),
            email: SafeEmail().fake(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
        }
    }

    #[tokio::test]
    async fn test_invite_creates_agent_and_sends_invitation() {
        let f = fixture();

        let agent = f.agents.invite(&f.boss, command("new.agent")).await.unwrap();

        assert_eq!(agent.organisation_id, f.boss.organisation_id);
        assert!(agent.user.is_agent());
        assert_eq!(f.agents.list(&f.boss).await.unwrap().len(), 1);

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject(), "You are invited");
        assert_eq!(sent[0].recipients(), vec![agent.user.email.clone()]);
    }

    #[tokio::test]
    async fn test_invite_rejects_taken_username() {
        let f = fixture();
        f.agents.invite(&f.boss, command("dup")).await.unwrap();

        let result = f.agents.invite(&f.boss, command("DUP")).await;
        assert!(matches!(result, Err(DomainError::Validation(e)) if e.contains("username")));
    }

    #[tokio::test]
    async fn test_invite_reports_taken_username_with_field_errors() {
        let f = fixture();
        f.agents.invite(&f.boss, command("dup")).await.unwrap();

        let mut second = command("dup");
        second.email = "not-an-email".to_string();
        match f.agents.invite(&f.boss, second).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("username"));
                assert!(errors.contains("email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(f.agents.list(&f.boss).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_reports_taken_username_with_field_errors() {
        let f = fixture();
        f.store.seed_agent(f.boss.organisation_id, "first.agent", "agent-pass-1");
        let second = f.store.seed_agent(f.boss.organisation_id, "second.agent", "agent-pass-1");

        let mut update = command("first.agent");
        update.email = "not-an-email".to_string();
        match f.agents.update(&f.boss, &second.id, update).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("username"));
                assert!(errors.contains("email"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(f.store.user(&second.user.id).unwrap().username, "second.agent");
    }

    #[tokio::test]
    async fn test_agents_cannot_manage_agents() {
        let f = fixture();
        let profile = f.store.seed_agent(f.boss.organisation_id, "field.agent", "agent-pass-1");
        let caller = Principal::agent(&profile, Uuid::new_v4());

        assert!(matches!(f.agents.list(&caller).await, Err(DomainError::Forbidden(_))));
        assert!(matches!(
            f.agents.invite(&caller, command("sneaky")).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_other_organisation_agents_are_not_found() {
        let f = fixture();
        let (_, other_org) = f.store.seed_organisor("rival", "s3cure-pass");
        let foreign = f.store.seed_agent(other_org.id, "their.agent", "agent-pass-1");

        assert!(matches!(f.agents.get(&f.boss, &foreign.id).await, Err(DomainError::NotFound(_))));
        assert!(matches!(
            f.agents.update(&f.boss, &foreign.id, command("stolen")).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(f.agents.remove(&f.boss, &foreign.id).await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_own_username() {
        let f = fixture();
        let agent = f.store.seed_agent(f.boss.organisation_id, "field.agent", "agent-pass-1");

        let mut update = command("field.agent");
        update.first_name = "Renamed".to_string();
        let updated = f.agents.update(&f.boss, &agent.id, update).await.unwrap();

        assert_eq!(updated.user.first_name, "Renamed");
        assert_eq!(f.store.user(&agent.user.id).unwrap().first_name, "Renamed");
    }

    #[tokio::test]
    async fn test_remove_unassigns_leads_and_disables_user() {
        let f = fixture();
        let agent = f.store.seed_agent(f.boss.organisation_id, "field.agent", "agent-pass-1");
        let lead = f.store.seed_lead(f.boss.organisation_id, Some(agent.id), None);

        f.agents.remove(&f.boss, &agent.id).await.unwrap();

        assert!(f.store.lead(&lead.id).unwrap().agent_id.is_none());
        assert!(f.store.user(&agent.user.id).unwrap().is_deleted());
        assert!(f.agents.list(&f.boss).await.unwrap().is_empty());
    }
}
