/// OAuth 2.0 authorization-code flow against external identity providers.
///
/// Each configured provider gets one [`OAuthClient`] that can build the
/// consent-screen redirect URL and exchange a callback code for the
/// account's verified email address. Everything downstream of the email
/// lookup (user creation, provider conflicts, session issuance) lives
/// in [`super::auth::AuthService::oauth_login`].
use std::collections::HashMap;

use serde_json::Value;

use crate::config::OAuthProviderSettings;
use crate::error::{AuthError, Result};
use crate::models::OAuthProvider;

struct ProviderEndpoints {
    authorize_url: &'static str,
    token_url: &'static str,
    userinfo_url: &'static str,
    scopes: &'static str,
}

fn endpoints_for(provider: OAuthProvider) -> Result<ProviderEndpoints> {
    match provider {
        OAuthProvider::Discord => Ok(ProviderEndpoints {
            authorize_url: "https://discord.com/oauth2/authorize",
            token_url: "https://discord.com/api/oauth2/token",
            userinfo_url: "https://discord.com/api/users/@me",
            scopes: "identify email",
        }),
        OAuthProvider::Google => Ok(ProviderEndpoints {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo",
            scopes: "openid email profile",
        }),
        OAuthProvider::Facebook => Ok(ProviderEndpoints {
            authorize_url: "https://www.facebook.com/v18.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v18.0/oauth/access_token",
            userinfo_url: "https://graph.facebook.com/me?fields=id,name,email",
            scopes: "email public_profile",
        }),
        OAuthProvider::Github => Ok(ProviderEndpoints {
            authorize_url: "https://github.com/login/oauth/authorize",
            token_url: "https://github.com/login/oauth/access_token",
            userinfo_url: "https://api.github.com/user",
            scopes: "read:user user:email",
        }),
        OAuthProvider::Email => Err(AuthError::OAuth(
            "email is not an external OAuth provider".to_string(),
        )),
    }
}

#[derive(Clone)]
pub struct OAuthClient {
    provider: OAuthProvider,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(provider: OAuthProvider, settings: &OAuthProviderSettings) -> Self {
        Self {
            provider,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn provider(&self) -> OAuthProvider {
        self.provider
    }

    /// URL of the provider's consent screen for the code flow.
    pub fn authorize_url(&self) -> Result<String> {
        let endpoints = endpoints_for(self.provider)?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            endpoints.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(endpoints.scopes),
        ))
    }

    /// Exchange the callback `code` for an access token, then fetch the
    /// account profile and return its email address.
    pub async fn resolve_email(&self, code: &str) -> Result<String> {
        let endpoints = endpoints_for(self.provider)?;
        let access_token = self.exchange_code(&endpoints, code).await?;
        self.fetch_email(&endpoints, &access_token).await
    }

    async fn exchange_code(&self, endpoints: &ProviderEndpoints, code: &str) -> Result<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(endpoints.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::OAuth(format!("token exchange request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::OAuth(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AuthError::OAuth(format!("invalid token response: {}", e)))?;

        body.get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AuthError::OAuth("token response missing access_token".to_string()))
    }

    async fn fetch_email(&self, endpoints: &ProviderEndpoints, access_token: &str) -> Result<String> {
        let mut request = self
            .http
            .get(endpoints.userinfo_url)
            .bearer_auth(access_token);

        // Github rejects requests without a User-Agent.
        if self.provider == OAuthProvider::Github {
            request = request.header(reqwest::header::USER_AGENT, "auth-service");
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::OAuth(format!("userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::OAuth(format!(
                "userinfo request failed with status {}",
                response.status()
            )));
        }

        let profile: Value = response
            .json()
            .await
            .map_err(|e| AuthError::OAuth(format!("invalid userinfo response: {}", e)))?;

        profile
            .get("email")
            .and_then(Value::as_str)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                AuthError::OAuth(format!(
                    "{} profile has no verified email address",
                    self.provider
                ))
            })
    }
}

/// All providers enabled by configuration, keyed by provider.
#[derive(Clone, Default)]
pub struct OAuthRegistry {
    clients: HashMap<OAuthProvider, OAuthClient>,
}

impl OAuthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client: OAuthClient) {
        self.clients.insert(client.provider(), client);
    }

    pub fn get(&self, provider: OAuthProvider) -> Result<&OAuthClient> {
        self.clients
            .get(&provider)
            .ok_or_else(|| AuthError::OAuth(format!("provider {} is not configured", provider)))
    }
}
