// ============================================================================
// CRM Core - Authentication Service
// File: crates/crm-core/src/services/auth_service.rs
// ============================================================================
//! Signup, login, logout and access-token authentication

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crm_security::{JwtService, PasswordService};
use crm_shared::utils::mask_email;

use crate::access::Principal;
use crate::domain::user::validate_username;
use crate::domain::{Organisation, User, UserRole, UserSession};
use crate::error::{DomainError, FieldErrors};
use crate::repositories::Repositories;
use super::password_rule_errors;

/// Signup form for a new organisor.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupCommand {
    #[validate(
        length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,

    #[validate(must_match(other = "password", message = "The two password fields didn't match."))]
    pub password_confirm: String,
}

pub struct AuthService {
    repos: Repositories,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(repos: Repositories, jwt: JwtService) -> Self {
        Self { repos, jwt }
    }

    /// Register an organisor together with its organisation
    pub async fn signup(&self, command: SignupCommand) -> Result<UserInfo, DomainError> {
        info!("Signup attempt for username: {}", command.username);

        let mut errors = match command.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };
        errors.merge(password_rule_errors("password", &command.password, &command.username));

        if self.repos.users.find_by_username(&command.username).await?.is_some() {
            errors.add("username", "A user with that username already exists.");
        }
        if self.repos.users.find_by_email(&command.email).await?.is_some() {
            errors.add("email", "A user with that email already exists.");
        }
        if !errors.is_empty() {
            warn!("Signup rejected for username: {}", command.username);
            return Err(DomainError::Validation(errors));
        }

        let password_hash = PasswordService::hash(&command.password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;

        let user = User::new(&command.username, &command.email, "", "", password_hash, UserRole::Organisor)?;
        let organisation = Organisation::for_owner(&user)?;

        let (user, organisation) = self.repos.users.create_organisor(&user, &organisation).await?;

        info!(user_id = %user.id, organisation_id = %organisation.id, "Organisor signed up");
        Ok(UserInfo::new(&user, organisation.id))
    }

    /// Login with username and password
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, DomainError> {
        info!("Login attempt for username: {}", username);

        // 1. Find user by username
        let user = self.repos.users.find_by_username(username).await?.ok_or_else(|| {
            warn!("Login failed: unknown username: {}", username);
            DomainError::InvalidCredentials
        })?;

        // 2. Verify password
        let password_valid = PasswordService::verify(password, &user.password_hash)
            .map_err(|_| DomainError::InvalidCredentials)?;
        if !password_valid {
            warn!("Login failed: invalid password for: {}", username);
            return Err(DomainError::InvalidCredentials);
        }

        // 3. Check if user can login
        if !user.can_login() {
            warn!("Login failed: user {} is not active", user.id);
            return Err(DomainError::UserNotActive);
        }

        // 4. Resolve the organisation the user acts for
        let organisation_id = self.organisation_of(&user).await?;

        // 5. Open a session and sign the access token for it
        let session = UserSession::new(user.id, self.jwt.access_token_expiry());
        let session = self.repos.sessions.create(&session).await?;

        let access_token = self
            .jwt
            .generate_access_token(&user.id, &session.id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        // 6. Update last login
        if let Err(e) = self.repos.users.record_login(&user.id, Utc::now()).await {
            error!("Failed to update last login: {}", e);
        }

        info!("Login successful for: {}", mask_email(&user.email));

        Ok(LoginResult {
            user: UserInfo::new(&user, organisation_id),
            access_token,
            expires_in: self.jwt.access_token_expiry(),
        })
    }

    /// Resolve a bearer token to the calling principal
    pub async fn authenticate(&self, token: &str) -> Result<Principal, DomainError> {
        let claims = self
            .jwt
            .validate_token(token)
            .map_err(|e| DomainError::Unauthenticated(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| DomainError::Unauthenticated(e.to_string()))?;
        let session_id = claims
            .session_id()
            .map_err(|e| DomainError::Unauthenticated(e.to_string()))?;

        let session = self
            .repos
            .sessions
            .find_active(&session_id, Utc::now())
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| DomainError::Unauthenticated("session expired or revoked".to_string()))?;

        let user = self
            .repos
            .users
            .find_by_id(&user_id)
            .await?
            .filter(User::can_login)
            .ok_or_else(|| DomainError::Unauthenticated("account is not active".to_string()))?;

        match user.role {
            UserRole::Organisor => {
                let organisation = self
                    .repos
                    .organisations
                    .find_by_owner(&user.id)
                    .await?
                    .ok_or_else(|| DomainError::Unauthenticated("organisation missing".to_string()))?;
                Ok(Principal::organisor(&user, &organisation, session.id))
            }
            UserRole::Agent => {
                let profile = self
                    .repos
                    .agents
                    .find_by_user(&user.id)
                    .await?
                    .ok_or_else(|| DomainError::Unauthenticated("agent profile missing".to_string()))?;
                Ok(Principal::agent(&profile, session.id))
            }
        }
    }

    /// Revoke the caller's current session
    pub async fn logout(&self, principal: &Principal) -> Result<(), DomainError> {
        self.repos.sessions.revoke(&principal.session_id).await?;
        info!(user_id = %principal.user_id, "Logged out");
        Ok(())
    }

    async fn organisation_of(&self, user: &User) -> Result<Uuid, DomainError> {
        let organisation_id = match user.role {
            UserRole::Organisor => self
                .repos
                .organisations
                .find_by_owner(&user.id)
                .await?
                .map(|o| o.id),
            UserRole::Agent => self
                .repos
                .agents
                .find_by_user(&user.id)
                .await?
                .map(|a| a.organisation_id),
        };
        organisation_id.ok_or_else(|| {
            error!("User {} has no organisation", user.id);
            DomainError::UserNotActive
        })
    }
}

/// Result of successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserInfo,
    pub access_token: String,
    pub expires_in: i64,
}

/// User info returned in auth responses
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub organisation_id: Uuid,
}

impl UserInfo {
    pub fn new(user: &User, organisation_id: Uuid) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            organisation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::UserRepository;
    use crate::testing::InMemoryStore;
    use std::sync::Arc;

    fn service(store: &Arc<InMemoryStore>) -> AuthService {
        AuthService::new(store.repositories(), JwtService::new("test-secret", 3600))
    }

    fn signup(username: &str, email: &str, password: &str) -> SignupCommand {
        SignupCommand {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirm: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_organisor_and_organisation() {
        let store = InMemoryStore::new();
        let auth = service(&store);

        let info = auth.signup(signup("acme", "owner@acme.test", "s3cure-pass")).await.unwrap();

        assert_eq!(info.role, UserRole::Organisor);
        let user = store.user(&info.id).unwrap();
        assert!(user.is_organisor());
        let organisation = store.repositories().organisations.find_by_owner(&info.id).await.unwrap().unwrap();
        assert_eq!(organisation.id, info.organisation_id);
        assert_eq!(organisation.name, "acme");
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicates_and_weak_passwords() {
        let store = InMemoryStore::new();
        store.seed_organisor("taken", "s3cure-pass");
        let auth = service(&store);

        let mut command = signup("Taken", "taken@example.com", "12345678");
        command.password_confirm = "different".to_string();

        match auth.signup(command).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains("username"));
                assert!(errors.contains("email"));
                assert!(errors.contains("password"));
                assert!(errors.contains("password_confirm"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_authenticate_logout() {
        let store = InMemoryStore::new();
        let (user, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let auth = service(&store);

        let result = auth.login("BOSS", "s3cure-pass").await.unwrap();
        assert_eq!(result.user.organisation_id, organisation.id);
        assert_eq!(result.expires_in, 3600);
        assert!(store.user(&user.id).unwrap().last_login.is_some());

        let principal = auth.authenticate(&result.access_token).await.unwrap();
        assert_eq!(principal.user_id, user.id);
        assert!(principal.is_organisor());

        auth.logout(&principal).await.unwrap();
        assert!(matches!(
            auth.authenticate(&result.access_token).await,
            Err(DomainError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn test_agent_login_resolves_agent_scope() {
        let store = InMemoryStore::new();
        let (_, organisation) = store.seed_organisor("boss", "s3cure-pass");
        let agent = store.seed_agent(organisation.id, "field.agent", "agent-pass-1");
        let auth = service(&store);

        let result = auth.login("field.agent", "agent-pass-1").await.unwrap();
        let principal = auth.authenticate(&result.access_token).await.unwrap();

        assert_eq!(principal.agent_id, Some(agent.id));
        assert_eq!(principal.organisation_id, organisation.id);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let store = InMemoryStore::new();
        let (user, _) = store.seed_organisor("boss", "s3cure-pass");
        let auth = service(&store);

        assert!(matches!(auth.login("boss", "wrong").await, Err(DomainError::InvalidCredentials)));
        assert!(matches!(auth.login("nobody", "x").await, Err(DomainError::InvalidCredentials)));

        let mut inactive = store.user(&user.id).unwrap();
        inactive.is_active = false;
        store.repositories().users.update(&inactive).await.unwrap();
        assert!(matches!(auth.login("boss", "s3cure-pass").await, Err(DomainError::UserNotActive)));
    }

    /// Changes the stored password right after the login lookup returns,
    /// like a reset committing while the hash is being verified.
    struct PasswordChangedDuringLogin {
        store: Arc<InMemoryStore>,
        new_hash: String,
    }

    #[async_trait::async_trait]
    impl UserRepository for PasswordChangedDuringLogin {
        async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
            self.store.find_by_id(id).await
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
            let found = self.store.find_by_username(username).await?;
            if let Some(user) = &found {
                let mut changed = user.clone();
                changed.set_password_hash(self.new_hash.clone());
                self.store.update(&changed).await?;
            }
            Ok(found)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
            self.store.find_by_email(email).await
        }

        async fn create_organisor(
            &self,
            user: &User,
            organisation: &Organisation,
        ) -> Result<(User, Organisation), DomainError> {
            self.store.create_organisor(user, organisation).await
        }

        async fn update(&self, user: &User) -> Result<User, DomainError> {
            self.store.update(user).await
        }

        async fn record_login(&self, id: &Uuid, at: chrono::DateTime<Utc>) -> Result<(), DomainError> {
            self.store.record_login(id, at).await
        }
    }

    #[tokio::test]
    async fn test_login_keeps_password_changed_concurrently() {
        let store = InMemoryStore::new();
        let (user, _) = store.seed_organisor("boss", "s3cure-pass");
        let new_hash = PasswordService::hash("n3w-passphrase").unwrap();

        let mut repos = store.repositories();
        repos.users = Arc::new(PasswordChangedDuringLogin {
            store: store.clone(),
            new_hash: new_hash.clone(),
        });
        let auth = AuthService::new(repos, JwtService::new("test-secret", 3600));

        auth.login("boss", "s3cure-pass").await.unwrap();

        let stored = store.user(&user.id).unwrap();
        assert_eq!(stored.password_hash, new_hash);
        assert!(stored.last_login.is_some());
        assert!(!PasswordService::verify("s3cure-pass", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_does_not_revive_removed_user() {
        let store = InMemoryStore::new();
        let (user, _) = store.seed_organisor("boss", "s3cure-pass");

        let mut removed = store.user(&user.id).unwrap();
        removed.soft_delete();
        store.update(&removed).await.unwrap();
        store.record_login(&user.id, Utc::now()).await.unwrap();

        let stored = store.user(&user.id).unwrap();
        assert!(stored.removed_at.is_some());
        assert!(stored.last_login.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_rejects_garbage() {
        let store = InMemoryStore::new();
        let auth = service(&store);
        assert!(matches!(
            auth.authenticate("not-a-token").await,
            Err(DomainError::Unauthenticated(_))
        ));
    }
}
