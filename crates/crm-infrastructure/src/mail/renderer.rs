//! Plain-text mail bodies rendered with Handlebars

use handlebars::{no_escape, Handlebars, TemplateError};
use serde_json::json;

use crm_core::error::DomainError;
use crm_core::notifier::Notification;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub struct MailRenderer {
    registry: Handlebars<'static>,
}

impl MailRenderer {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(no_escape);

        registry.register_template_string(
            "agent_invitation",
            include_str!("templates/agent_invitation.hbs"),
        )?;
        registry.register_template_string("lead_created", include_str!("templates/lead_created.hbs"))?;
        registry.register_template_string("password_reset", include_str!("templates/password_reset.hbs"))?;

        Ok(Self { registry })
    }

    pub fn render(&self, notification: &Notification) -> Result<RenderedMail, DomainError> {
        let data = match notification {
            Notification::AgentInvitation { username, organisation_name, .. } => json!({
                "username": username,
                "organisation_name": organisation_name,
            }),
            Notification::LeadCreated { lead_name, organisation_name, .. } => json!({
                "lead_name": lead_name,
                "organisation_name": organisation_name,
            }),
            Notification::PasswordReset { username, reset_url, .. } => json!({
                "username": username,
                "reset_url": reset_url,
            }),
        };

        let body = self
            .registry
            .render(notification.kind(), &data)
            .map_err(|e| DomainError::NotificationError(e.to_string()))?;

        Ok(RenderedMail {
            to: notification.recipients(),
            subject: notification.subject().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_invitation() {
        let renderer = MailRenderer::new().unwrap();
        let mail = renderer
            .render(&Notification::AgentInvitation {
                to: "agent@example.com".to_string(),
                username: "field.agent".to_string(),
                organisation_name: "Acme & Sons".to_string(),
            })
            .unwrap();

        assert_eq!(mail.subject, "You are invited");
        assert_eq!(mail.to, vec!["agent@example.com".to_string()]);
        assert!(mail.body.contains("You have been added as an agent to the CRM."));
        // plain text, no HTML escaping
        assert!(mail.body.contains("Acme & Sons"));
    }

    #[test]
    fn test_renders_reset_link() {
        let renderer = MailRenderer::new().unwrap();
        let mail = renderer
            .render(&Notification::PasswordReset {
                to: "boss@example.com".to_string(),
                username: "boss".to_string(),
                reset_url: "http://crm.test/reset-confirm/abc/123-def".to_string(),
            })
            .unwrap();

        assert!(mail.body.contains("http://crm.test/reset-confirm/abc/123-def"));
    }
}
