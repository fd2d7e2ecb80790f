//! Writes rendered mail to the log instead of sending it

use async_trait::async_trait;
use tracing::info;

use crm_core::error::DomainError;
use crm_core::notifier::{Notification, Notifier};

use super::renderer::MailRenderer;

pub struct ConsoleNotifier {
    renderer: MailRenderer,
}

impl ConsoleNotifier {
    pub fn new(renderer: MailRenderer) -> Self {
        Self { renderer }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, notification: Notification) -> Result<(), DomainError> {
        let mail = self.renderer.render(&notification)?;
        info!(
            kind = notification.kind(),
            to = ?mail.to,
            subject = %mail.subject,
            body = %mail.body,
            "Mail (console backend)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_backend_accepts_every_kind() {
        let notifier = ConsoleNotifier::new(MailRenderer::new().unwrap());
        let result = notifier
            .send(Notification::LeadCreated {
                to: vec!["sales@example.com".to_string()],
                lead_name: "Joe Soap".to_string(),
                organisation_name: "acme".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }
}
