//! SMTP delivery through lettre's async transport

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crm_core::error::DomainError;
use crm_core::notifier::{Notification, Notifier};
use crm_shared::config::MailSettings;
use crm_shared::utils::mask_email;

use super::renderer::MailRenderer;

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    renderer: MailRenderer,
}

impl SmtpNotifier {
    pub fn new(settings: &MailSettings, renderer: MailRenderer) -> Result<Self, DomainError> {
        let host = settings
            .smtp_host
            .as_deref()
            .ok_or_else(|| DomainError::NotificationError("mail.smtp_host is not set".to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| DomainError::NotificationError(e.to_string()))?
            .port(settings.smtp_port);

        if let (Some(username), Some(password)) = (&settings.smtp_username, &settings.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = settings
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| DomainError::NotificationError(format!("invalid from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
            renderer,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: Notification) -> Result<(), DomainError> {
        let mail = self.renderer.render(&notification)?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(mail.subject.clone());
        for recipient in &mail.to {
            let mailbox = recipient
                .parse::<Mailbox>()
                .map_err(|e| DomainError::NotificationError(format!("invalid recipient: {}", e)))?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .map_err(|e| DomainError::NotificationError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DomainError::NotificationError(e.to_string()))?;

        let recipients: Vec<String> = mail.to.iter().map(|r| mask_email(r)).collect();
        info!(kind = notification.kind(), ?recipients, "Mail sent");
        Ok(())
    }
}
