use std::sync::Arc;

use crm_core::notifier::Notifier;
use crm_core::repositories::Repositories;
use crm_core::services::{AgentService, AuthService, CategoryService, LeadService, PasswordResetService};
use crm_security::{JwtService, ResetTokenGenerator};
use crm_shared::config::AppConfig;

use crate::throttle::LoginThrottle;

/// The part of the configuration the HTTP layer needs.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub app_name: String,
    pub base_url: String,
    pub jwt_secret: String,
    pub access_token_expiry: i64,
    pub reset_secret: String,
    pub password_reset_timeout: i64,
    pub login_attempts_per_minute: u32,
    pub lead_notification_recipients: Vec<String>,
}

impl From<&AppConfig> for ApiSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            app_name: config.app.name.clone(),
            base_url: config.app.base_url.clone(),
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            reset_secret: config.security.secret_key.clone(),
            password_reset_timeout: config.security.password_reset_timeout,
            login_attempts_per_minute: config.security.login_attempts_per_minute,
            lead_notification_recipients: config.mail.lead_notification_recipients.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub auth: Arc<AuthService>,
    pub password_reset: Arc<PasswordResetService>,
    pub agents: Arc<AgentService>,
    pub leads: Arc<LeadService>,
    pub categories: Arc<CategoryService>,
    pub login_throttle: Arc<LoginThrottle>,
}

impl AppState {
    pub fn new(repos: Repositories, notifier: Arc<dyn Notifier>, settings: ApiSettings) -> Self {
        let jwt = JwtService::new(&settings.jwt_secret, settings.access_token_expiry);
        let reset_tokens = ResetTokenGenerator::new(&settings.reset_secret, settings.password_reset_timeout);

        Self {
            app_name: settings.app_name,
            auth: Arc::new(AuthService::new(repos.clone(), jwt)),
            password_reset: Arc::new(PasswordResetService::new(
                repos.clone(),
                notifier.clone(),
                reset_tokens,
                &settings.base_url,
            )),
            agents: Arc::new(AgentService::new(repos.clone(), notifier.clone())),
            leads: Arc::new(LeadService::new(
                repos.clone(),
                notifier,
                settings.lead_notification_recipients,
            )),
            categories: Arc::new(CategoryService::new(repos)),
            login_throttle: Arc::new(LoginThrottle::new(settings.login_attempts_per_minute)),
        }
    }
}
