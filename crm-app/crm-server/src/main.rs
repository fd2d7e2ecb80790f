use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crm_api::{build_router, ApiSettings, AppState};
use crm_core::notifier::Notifier;
use crm_infrastructure::{
    create_pool, postgres_repositories, run_migrations, ConsoleNotifier, MailRenderer, SmtpNotifier,
};
use crm_shared::config::{AppConfig, MailBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize telemetry
    let _log_guard = crm_shared::telemetry::init_telemetry(&config.log)?;

    info!("CRM Server starting ({} environment)...", config.app.env);

    // Connect to Database
    info!("Connecting to database...");
    let pool = create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Database connection established.");

    if config.database.run_migrations {
        run_migrations(&pool).await.context("Failed to run migrations")?;
    }

    // Mail backend
    let renderer = MailRenderer::new().context("Failed to load mail templates")?;
    let notifier: Arc<dyn Notifier> = match config.mail.backend {
        MailBackend::Smtp => Arc::new(SmtpNotifier::new(&config.mail, renderer)?),
        MailBackend::Console => {
            if config.is_production() {
                warn!("Console mail backend in production; e-mails are only logged");
            }
            Arc::new(ConsoleNotifier::new(renderer))
        }
    };

    // Create App State
    let state = AppState::new(postgres_repositories(pool), notifier, ApiSettings::from(&config));
    let app = build_router(state);

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
