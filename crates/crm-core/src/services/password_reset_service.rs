//! Password reset by e-mailed link
//!
//! A reset link carries the base64 user id and a token bound to the user's
//! current password hash and last login. Requesting a reset never reveals
//! whether the address belongs to an account.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crm_security::reset_token::{decode_uid, encode_uid, ResetTokenSubject};
use crm_security::{PasswordService, ResetTokenGenerator};
use crm_shared::utils::mask_email;

use crate::domain::User;
use crate::error::{DomainError, FieldErrors};
use crate::notifier::{deliver, Notification, Notifier};
use crate::repositories::Repositories;
use super::password_rule_errors;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetPasswordCommand {
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "The two password fields didn't match."))]
    pub new_password_confirm: String,
}

pub struct PasswordResetService {
    repos: Repositories,
    notifier: Arc<dyn Notifier>,
    tokens: ResetTokenGenerator,
    base_url: String,
}

fn subject(user: &User) -> ResetTokenSubject<'_> {
    ResetTokenSubject {
        user_id: &user.id,
        password_hash: &user.password_hash,
        last_login: user.last_login.map(|t| t.timestamp()),
    }
}

impl PasswordResetService {
    pub fn new(
        repos: Repositories,
        notifier: Arc<dyn Notifier>,
        tokens: ResetTokenGenerator,
        base_url: &str,
    ) -> Self {
        Self {
            repos,
            notifier,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// E-mails a reset link when an active account owns `email`.
    pub async fn request_reset(&self, email: &str) -> Result<(), DomainError> {
        let Some(user) = self.repos.users.find_by_email(email).await?.filter(User::can_login) else {
            info!("Password reset requested for unknown address {}", mask_email(email));
            return Ok(());
        };

        let token = match self.tokens.make_token(subject(&user), Utc::now().timestamp()) {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not issue reset token for {}: {}", user.id, e);
                return Ok(());
            }
        };
        let reset_url = format!("{}/reset-confirm/{}/{}", self.base_url, encode_uid(&user.id), token);

        deliver(
            self.notifier.as_ref(),
            Notification::PasswordReset {
                to: user.email.clone(),
                username: user.username.clone(),
                reset_url,
            },
        )
        .await;

        info!(user_id = %user.id, "Password reset link issued");
        Ok(())
    }

    /// The user a reset link belongs to, or `InvalidResetLink`.
    pub async fn check_link(&self, uidb64: &str, token: &str) -> Result<User, DomainError> {
        let user_id = decode_uid(uidb64).ok_or(DomainError::InvalidResetLink)?;
        let user = self
            .repos
            .users
            .find_by_id(&user_id)
            .await?
            .filter(User::can_login)
            .ok_or(DomainError::InvalidResetLink)?;

        if self.tokens.check_token(subject(&user), token, Utc::now().timestamp()) {
            Ok(user)
        } else {
            warn!(user_id = %user.id, "Rejected password reset token");
            Err(DomainError::InvalidResetLink)
        }
    }

    /// Sets the new password and signs the user out everywhere.
    pub async fn confirm_reset(
        &self,
        uidb64: &str,
        token: &str,
        command: SetPasswordCommand,
    ) -> Result<(), DomainError> {
        let mut user = self.check_link(uidb64, token).await?;

        let mut errors = match command.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };
        errors.merge(password_rule_errors("new_password", &command.new_password, &user.username));
        errors.into_result()?;

        let password_hash = PasswordService::hash(&command.new_password)
            .map_err(|e| DomainError::PasswordHashError(e.to_string()))?;
        user.set_password_hash(password_hash);
        self.repos.users.update(&user).await?;
        self.repos.sessions.revoke_all_for_user(&user.id).await?;

        info!(user_id = %user.id, "Password reset complete");
        Ok(())
    }
}
