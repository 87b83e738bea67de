/// Auth core: account lifecycle, session issuance, token rotation
///
/// Every operation takes its timestamps from the injected [`Clock`] so
/// expiry and throttle behavior is deterministic under test. Transport
/// concerns (cookies, redirects, status codes) stay in the handlers.
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::models::{NewUser, OAuthProvider, Role, SessionSummary, User, VerificationCodeKind};
use crate::security::jwt::{TokenCodec, TokenError};
use crate::security::password::{hash_password, verify_password};
use crate::services::email::{password_reset_message, verify_email_message, Mailer};
use crate::store::{SessionStore, UserStore, VerificationCodeStore};
use crate::time::Clock;

pub const SESSION_TTL_DAYS: i64 = 30;
/// Sessions within this window of expiring get their lifetime slid
/// forward on refresh, along with a replacement refresh token.
pub const SESSION_ROTATION_WINDOW_HOURS: i64 = 24;
pub const EMAIL_VERIFICATION_TTL_DAYS: i64 = 365;
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 60;
pub const RESET_THROTTLE_WINDOW_MINUTES: i64 = 5;
pub const RESET_THROTTLE_MAX_CODES: i64 = 2;

#[derive(Debug, Clone)]
pub struct RegisterParams {
    pub email: String,
    pub password: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginParams {
    pub email: String,
    pub password: String,
    pub user_agent: Option<String>,
}

/// A freshly authenticated user plus the token pair for their session.
#[derive(Debug, Clone)]
pub struct AuthBundle {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a refresh. `new_refresh_token` is only present when the
/// session was rotated.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub new_refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PasswordResetDispatch {
    pub email_url: String,
    pub delivery_id: String,
}

/// Identity established by a verified access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    LoggedOut,
    NotAuthenticated,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    codes: Arc<dyn VerificationCodeStore>,
    mailer: Arc<dyn Mailer>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    /// Public origin of the app, used to build links in outbound mail.
    origin: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        codes: Arc<dyn VerificationCodeStore>,
        mailer: Arc<dyn Mailer>,
        codec: TokenCodec,
        clock: Arc<dyn Clock>,
        origin: String,
    ) -> Self {
        Self {
            users,
            sessions,
            codes,
            mailer,
            codec,
            clock,
            origin,
        }
    }

    /// Create an email/password account, dispatch the verification
    /// email, and open a first session.
    pub async fn register(&self, params: RegisterParams) -> Result<AuthBundle> {
        if self.users.exists_by_email(&params.email).await? {
            return Err(AuthError::EmailInUse);
        }

        let password_hash = hash_password(&params.password)?;
        // The unique constraint still arbitrates a concurrent duplicate.
        let user = self
            .users
            .create(NewUser {
                email: params.email,
                password_hash: Some(password_hash),
                oauth_provider: OAuthProvider::Email,
            })
            .await?;

        // A failed verification email must not lose the account the
        // user just created; they can re-trigger verification later.
        if let Err(e) = self.dispatch_verification_email(&user).await {
            warn!(user_id = %user.id, error = %e, "failed to send verification email");
        }

        info!(user_id = %user.id, "user registered");
        self.create_session_bundle(user, params.user_agent.as_deref())
            .await
    }

    /// Password login. Unknown email, wrong password, and passwordless
    /// OAuth accounts all fail with the same message so the response
    /// does not reveal whether an email is registered.
    pub async fn login(&self, params: LoginParams) -> Result<AuthBundle> {
        let user = self
            .users
            .find_by_email(&params.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&params.password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        self.create_session_bundle(user, params.user_agent.as_deref())
            .await
    }

    /// Log in (or register on first contact) through a third-party
    /// OAuth identity. An existing account bound to a different login
    /// method is a conflict; no session is created for it.
    pub async fn oauth_login(
        &self,
        provider: OAuthProvider,
        email: &str,
        user_agent: Option<&str>,
    ) -> Result<AuthBundle> {
        let user = match self.users.find_by_email(email).await? {
            Some(user) => {
                if user.oauth_provider != provider {
                    return Err(AuthError::InvalidLoginMethod {
                        provider: user.oauth_provider,
                    });
                }
                user
            }
            None => {
                let user = self
                    .users
                    .create(NewUser {
                        email: email.to_string(),
                        password_hash: None,
                        oauth_provider: provider,
                    })
                    .await?;
                info!(user_id = %user.id, %provider, "user registered via oauth");
                user
            }
        };

        self.create_session_bundle(user, user_agent).await
    }

    /// Exchange a refresh token for a new access token. When the
    /// session is within 24 hours of expiring, slide it forward by the
    /// full session TTL and also mint a replacement refresh token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshedTokens> {
        let claims = self
            .codec
            .verify_refresh(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        // A deleted session and an expired one look the same to the
        // client: the session is over.
        let session = self
            .sessions
            .find_by_id(claims.session_id)
            .await?
            .ok_or(AuthError::SessionExpired)?;

        let now = self.clock.now();
        if !session.is_valid_at(now) {
            self.sessions.delete_by_id(session.id).await?;
            return Err(AuthError::SessionExpired);
        }

        let new_refresh_token = if session.expires_at - now
            < Duration::hours(SESSION_ROTATION_WINDOW_HOURS)
        {
            let new_expiry = now + Duration::days(SESSION_TTL_DAYS);
            self.sessions.update_expiry(session.id, new_expiry).await?;
            info!(session_id = %session.id, "session rotated");
            Some(self.codec.sign_refresh(session.id, claims.user_role, now)?)
        } else {
            None
        };

        // The session row, not the token, says who owns the session.
        let access_token =
            self.codec
                .sign_access(session.user_id, claims.user_role, session.id, now)?;

        Ok(RefreshedTokens {
            access_token,
            new_refresh_token,
        })
    }

    /// Verify an access token into an identity. The session backing the
    /// token must still exist and be unexpired.
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthContext> {
        let claims = self.codec.verify_access(access_token).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::InvalidToken,
        })?;

        let session = self
            .sessions
            .find_by_id(claims.session_id)
            .await?
            .ok_or(AuthError::NotAuthenticated)?;
        if !session.is_valid_at(self.clock.now()) {
            return Err(AuthError::NotAuthenticated);
        }

        Ok(AuthContext {
            user_id: claims.user_id,
            session_id: claims.session_id,
            role: claims.user_role,
        })
    }

    /// Tear down the session behind an access token. A missing or
    /// invalid token is reported, not an error; logout is best-effort.
    pub async fn logout(&self, access_token: Option<&str>) -> Result<LogoutOutcome> {
        let Some(token) = access_token else {
            return Ok(LogoutOutcome::NotAuthenticated);
        };
        let Ok(claims) = self.codec.verify_access(token) else {
            return Ok(LogoutOutcome::NotAuthenticated);
        };

        self.sessions.delete_by_id(claims.session_id).await?;
        info!(session_id = %claims.session_id, "user logged out");
        Ok(LogoutOutcome::LoggedOut)
    }

    /// Consume an email-verification code and mark the account verified.
    pub async fn verify_email(&self, code_id: Uuid) -> Result<User> {
        let now = self.clock.now();
        let code = self
            .codes
            .find_active_by_id(code_id, VerificationCodeKind::EmailVerification, now)
            .await?
            .ok_or(AuthError::InvalidVerificationCode)?;

        let user = self
            .users
            .set_verified(code.user_id)
            .await?
            .ok_or(AuthError::InvalidVerificationCode)?;

        self.codes.delete_by_id(code.id).await?;
        info!(user_id = %user.id, "email verified");
        Ok(user)
    }

    /// Issue a password-reset code and email its link. Creation is
    /// throttled per user; delivery failure here is fatal because the
    /// user explicitly asked for this email.
    pub async fn send_password_reset_email(&self, email: &str) -> Result<PasswordResetDispatch> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let now = self.clock.now();
        let window_start = now - Duration::minutes(RESET_THROTTLE_WINDOW_MINUTES);
        let recent = self
            .codes
            .count_for_user_since(user.id, VerificationCodeKind::PasswordReset, window_start)
            .await?;
        if recent >= RESET_THROTTLE_MAX_CODES {
            return Err(AuthError::TooManyRequests);
        }

        let expires_at = now + Duration::minutes(PASSWORD_RESET_TTL_MINUTES);
        let code = self
            .codes
            .create(user.id, VerificationCodeKind::PasswordReset, expires_at)
            .await?;

        let url = format!(
            "{}/api/v1/auth/password/reset?code={}&expiresAt={}",
            self.origin,
            code.id,
            expires_at.timestamp_millis()
        );
        let delivery_id = self
            .mailer
            .send(password_reset_message(&user.email, &url))
            .await?;

        info!(user_id = %user.id, "password reset email sent");
        Ok(PasswordResetDispatch {
            email_url: url,
            delivery_id,
        })
    }

    /// Set a new password from a reset code, then invalidate every
    /// session the user has. All outstanding tokens die with them.
    pub async fn reset_password(&self, code_id: Uuid, new_password: &str) -> Result<User> {
        let now = self.clock.now();
        let code = self
            .codes
            .find_active_by_id(code_id, VerificationCodeKind::PasswordReset, now)
            .await?
            .ok_or(AuthError::InvalidVerificationCode)?;

        let password_hash = hash_password(new_password)?;
        let user = self
            .users
            .update_password(code.user_id, &password_hash)
            .await?
            .ok_or(AuthError::InvalidVerificationCode)?;

        self.codes.delete_by_id(code.id).await?;
        let revoked = self.sessions.delete_all_for_user(user.id).await?;
        info!(user_id = %user.id, revoked, "password reset, all sessions revoked");
        Ok(user)
    }

    /// Active sessions for a user, newest first, with the caller's own
    /// session flagged.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        current_session_id: Uuid,
    ) -> Result<Vec<SessionSummary>> {
        let sessions = self
            .sessions
            .list_active_for_user(user_id, self.clock.now())
            .await?;
        if sessions.is_empty() {
            return Err(AuthError::NoSessionsFound);
        }

        Ok(sessions
            .into_iter()
            .map(|s| {
                let is_current = s.id == current_session_id;
                SessionSummary {
                    id: s.id,
                    user_agent: s.user_agent,
                    created_at: s.created_at,
                    is_current,
                }
            })
            .collect())
    }

    /// Delete one of the caller's sessions by id.
    pub async fn revoke_session(&self, session_id: Uuid, user_id: Uuid) -> Result<()> {
        let deleted = self.sessions.delete_for_user(session_id, user_id).await?;
        if !deleted {
            return Err(AuthError::SessionNotFound);
        }
        info!(%session_id, "session revoked");
        Ok(())
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn list_users(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let total = self.users.count_all().await?;
        let users = self.users.list_page(limit, offset).await?;
        Ok((users, total))
    }

    async fn dispatch_verification_email(&self, user: &User) -> Result<String> {
        let now = self.clock.now();
        let code = self
            .codes
            .create(
                user.id,
                VerificationCodeKind::EmailVerification,
                now + Duration::days(EMAIL_VERIFICATION_TTL_DAYS),
            )
            .await?;

        let url = format!("{}/api/v1/auth/email/verify/{}", self.origin, code.id);
        self.mailer
            .send(verify_email_message(&user.email, &url))
            .await
    }

    async fn create_session_bundle(
        &self,
        user: User,
        user_agent: Option<&str>,
    ) -> Result<AuthBundle> {
        let now = self.clock.now();
        let session = self
            .sessions
            .create(user.id, user_agent, now + Duration::days(SESSION_TTL_DAYS))
            .await?;

        let access_token = self
            .codec
            .sign_access(user.id, user.role, session.id, now)?;
        let refresh_token = self.codec.sign_refresh(session.id, user.role, now)?;

        Ok(AuthBundle {
            user,
            access_token,
            refresh_token,
        })
    }
}
