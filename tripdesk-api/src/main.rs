use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripdesk_api::{
    app,
    mailer::{LogMailer, Mailer, SmtpMailer},
    state::{AppState, AuthConfig, LoginLimits},
    worker::spawn_mail_worker,
};
use tripdesk_store::{app_config::Config, DbClient, PgAdminRepository, PgBookingRepository};

const MAIL_QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripdesk_api=debug,tripdesk_core=info,tripdesk_store=info,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting TripDesk API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let query_timeout = Duration::from_secs(config.database.query_timeout_seconds);
    let bookings = Arc::new(PgBookingRepository::new(db.pool.clone(), query_timeout));
    let admins = Arc::new(PgAdminRepository::new(db.pool.clone(), query_timeout));

    let mailer: Arc<dyn Mailer> = match SmtpMailer::from_config(&config.mail).context("Invalid mail config")? {
        Some(smtp) => Arc::new(smtp),
        None => {
            tracing::warn!("SMTP host not configured, confirmation mails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let (dispatcher, _mail_worker) = spawn_mail_worker(mailer, MAIL_QUEUE_CAPACITY);

    let app_state = AppState::new(
        bookings,
        admins,
        Arc::new(dispatcher),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.token_ttl_seconds,
        },
        LoginLimits {
            attempts: config.auth.login_attempts,
            window: Duration::from_secs(config.auth.login_window_seconds),
        },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
