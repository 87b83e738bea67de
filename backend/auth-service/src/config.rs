//! Configuration management for Auth Service
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

use crate::models::OAuthProvider;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    pub email: EmailSettings,
    pub app: AppSettings,
    pub oauth: OAuthSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            server: ServerSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            email: EmailSettings::from_env()?,
            app: AppSettings::from_env()?,
            oauth: OAuthSettings::from_env(),
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "4004".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}

/// JWT signing settings. Access and refresh tokens use distinct secrets
/// so one kind can never verify as the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub audience: String,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            access_secret: env::var("JWT_ACCESS_SECRET")
                .context("JWT_ACCESS_SECRET must be set")?,
            refresh_secret: env::var("JWT_REFRESH_SECRET")
                .context("JWT_REFRESH_SECRET must be set")?,
            audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "auth-service".to_string()),
        })
    }
}

/// Email service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@localhost".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }
}

/// App-level settings: the public origin used for email links and OAuth
/// redirects, and whether cookies run in cross-site secure mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub origin: String,
    pub secure_cookies: bool,
}

impl AppSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            origin: env::var("APP_ORIGIN").context("APP_ORIGIN must be set")?,
            secure_cookies: env::var("APP_SECURE_COOKIES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }
}

/// Credentials for a single OAuth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// OAuth provider configuration. Each provider is optional; unset
/// providers simply are not registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    pub discord: Option<OAuthProviderSettings>,
    pub google: Option<OAuthProviderSettings>,
    pub facebook: Option<OAuthProviderSettings>,
    pub github: Option<OAuthProviderSettings>,
}

impl OAuthSettings {
    fn from_env() -> Self {
        Self {
            discord: Self::provider_from_env("DISCORD"),
            google: Self::provider_from_env("GOOGLE"),
            facebook: Self::provider_from_env("FACEBOOK"),
            github: Self::provider_from_env("GITHUB"),
        }
    }

    fn provider_from_env(prefix: &str) -> Option<OAuthProviderSettings> {
        let client_id = env::var(format!("OAUTH_{}_CLIENT_ID", prefix)).ok()?;
        let client_secret = env::var(format!("OAUTH_{}_CLIENT_SECRET", prefix)).ok()?;
        let redirect_uri = env::var(format!("OAUTH_{}_REDIRECT_URI", prefix)).ok()?;
        Some(OAuthProviderSettings {
            client_id,
            client_secret,
            redirect_uri,
        })
    }

    pub fn configured(&self) -> Vec<(OAuthProvider, &OAuthProviderSettings)> {
        [
            (OAuthProvider::Discord, &self.discord),
            (OAuthProvider::Google, &self.google),
            (OAuthProvider::Facebook, &self.facebook),
            (OAuthProvider::Github, &self.github),
        ]
        .into_iter()
        .filter_map(|(provider, settings)| settings.as_ref().map(|s| (provider, s)))
        .collect()
    }
}
