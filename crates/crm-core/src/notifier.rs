//! Outgoing notifications (port)

use async_trait::async_trait;

use crate::error::DomainError;

/// Messages the CRM sends as a side-effect of a committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    AgentInvitation {
        to: String,
        username: String,
        organisation_name: String,
    },
    LeadCreated {
        to: Vec<String>,
        lead_name: String,
        organisation_name: String,
    },
    PasswordReset {
        to: String,
        username: String,
        reset_url: String,
    },
}

impl Notification {
    pub fn recipients(&self) -> Vec<String> {
        match self {
            Notification::AgentInvitation { to, .. } => vec![to.clone()],
            Notification::LeadCreated { to, .. } => to.clone(),
            Notification::PasswordReset { to, .. } => vec![to.clone()],
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Notification::AgentInvitation { .. } => "You are invited",
            Notification::LeadCreated { .. } => "New lead",
            Notification::PasswordReset { .. } => "Password reset",
        }
    }

    /// Short name used in logs and template lookup.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::AgentInvitation { .. } => "agent_invitation",
            Notification::LeadCreated { .. } => "lead_created",
            Notification::PasswordReset { .. } => "password_reset",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), DomainError>;
}

/// Sends and logs a failure at `warn` instead of returning it.
pub async fn deliver(notifier: &dyn Notifier, notification: Notification) {
    let kind = notification.kind();
    if let Err(e) = notifier.send(notification).await {
        tracing::warn!(kind, error = %e, "notification delivery failed");
    }
}
