/// Auth Service Main Entry Point
///
/// Starts the HTTP server with:
/// - PostgreSQL connection pool (migrations applied on boot)
/// - SMTP mailer (no-op mode when unconfigured)
/// - OAuth provider registry
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use auth_service::config::Settings;
use auth_service::db::{PgSessionStore, PgUserStore, PgVerificationCodeStore};
use auth_service::routes::{build_router, AppState};
use auth_service::security::jwt::TokenCodec;
use auth_service::services::{AuthService, OAuthClient, OAuthRegistry, SmtpMailer};
use auth_service::time::SystemClock;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "auth_service=info,info".into()),
        )
        .with_target(false)
        .init();

    info!("Starting Auth Service");

    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    let mailer = SmtpMailer::new(&settings.email)
        .map_err(|e| anyhow::anyhow!("Failed to initialize mailer: {}", e))?;

    let mut oauth = OAuthRegistry::new();
    for (provider, provider_settings) in settings.oauth.configured() {
        oauth.register(OAuthClient::new(provider, provider_settings));
        info!(%provider, "OAuth provider registered");
    }

    let codec = TokenCodec::new(
        &settings.jwt.access_secret,
        &settings.jwt.refresh_secret,
        &settings.jwt.audience,
    );

    let auth = AuthService::new(
        Arc::new(PgUserStore::new(db_pool.clone())),
        Arc::new(PgSessionStore::new(db_pool.clone())),
        Arc::new(PgVerificationCodeStore::new(db_pool.clone())),
        Arc::new(mailer),
        codec,
        Arc::new(SystemClock),
        settings.app.origin.clone(),
    );

    let state = AppState {
        auth,
        oauth,
        secure_cookies: settings.app.secure_cookies,
        origin: settings.app.origin.clone(),
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Auth service shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
