/// Token codec: signing and verification of access and refresh tokens
///
/// Two token kinds, each signed HS256 with its own secret:
///
/// - access token (15 minutes): `{ user_id, user_role, session_id }`
/// - refresh token (30 days): `{ session_id, user_role }`
///
/// The refresh payload deliberately omits the user id. The session row
/// is the source of truth for which user owns a session, so a replayed
/// refresh token cannot claim a different user without also controlling
/// the session store.
///
/// Both kinds carry a fixed audience claim; verification rejects tokens
/// minted for a different audience. Verification failures distinguish
/// "expired" from "otherwise invalid" because callers surface different
/// messages for the two.
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::models::Role;

pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub user_role: Role,
    pub session_id: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub session_id: Uuid,
    pub user_role: Role,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies both token kinds. Pure: no I/O, the mint
/// timestamp is passed in by the caller.
#[derive(Clone)]
pub struct TokenCodec {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    audience: String,
}

impl TokenCodec {
    pub fn new(access_secret: &str, refresh_secret: &str, audience: impl Into<String>) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            audience: audience.into(),
        }
    }

    pub fn sign_access(
        &self,
        user_id: Uuid,
        user_role: Role,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let claims = AccessClaims {
            user_id,
            user_role,
            session_id,
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign access token: {}", e)))
    }

    pub fn sign_refresh(
        &self,
        session_id: Uuid,
        user_role: Role,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let claims = RefreshClaims {
            session_id,
            user_role,
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::days(REFRESH_TOKEN_TTL_DAYS)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign refresh token: {}", e)))
    }

    pub fn verify_access(&self, token: &str) -> std::result::Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.access_decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(classify)
    }

    pub fn verify_refresh(&self, token: &str) -> std::result::Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(classify)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud"]);
        validation
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("access-secret", "refresh-secret", "auth-service")
    }

    #[test]
    fn test_access_token_round_trip() {
        let codec = codec();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let now = Utc::now();

        let token = codec
            .sign_access(user_id, Role::User, session_id, now)
            .expect("sign should succeed");
        let claims = codec.verify_access(&token).expect("verify should succeed");

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.user_role, Role::User);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_MINUTES * 60);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let codec = codec();
        let session_id = Uuid::new_v4();
        let now = Utc::now();

        let token = codec
            .sign_refresh(session_id, Role::Admin, now)
            .expect("sign should succeed");
        let claims = codec.verify_refresh(&token).expect("verify should succeed");

        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.user_role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_DAYS * 24 * 3600);
    }

    #[test]
    fn test_kind_secrets_are_distinct() {
        // An access token must not verify as a refresh token, and vice versa.
        let codec = codec();
        let now = Utc::now();
        let access = codec
            .sign_access(Uuid::new_v4(), Role::User, Uuid::new_v4(), now)
            .expect("sign should succeed");
        let refresh = codec
            .sign_refresh(Uuid::new_v4(), Role::User, now)
            .expect("sign should succeed");

        assert_eq!(codec.verify_refresh(&access), Err(TokenError::Invalid));
        assert_eq!(codec.verify_access(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn test_audience_mismatch_rejected() {
        let ours = codec();
        let theirs = TokenCodec::new("access-secret", "refresh-secret", "some-other-service");
        let token = theirs
            .sign_access(Uuid::new_v4(), Role::User, Uuid::new_v4(), Utc::now())
            .expect("sign should succeed");

        assert_eq!(ours.verify_access(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token_distinguished_from_invalid() {
        let codec = codec();
        // Minted two hours in the past, so well beyond the 15 minute TTL
        // and the default validation leeway.
        let past = Utc::now() - Duration::hours(2);
        let token = codec
            .sign_access(Uuid::new_v4(), Role::User, Uuid::new_v4(), past)
            .expect("sign should succeed");

        assert_eq!(codec.verify_access(&token), Err(TokenError::Expired));
        assert_eq!(codec.verify_access("garbage"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = codec();
        let other = TokenCodec::new("different-secret", "refresh-secret", "auth-service");
        let token = other
            .sign_access(Uuid::new_v4(), Role::User, Uuid::new_v4(), Utc::now())
            .expect("sign should succeed");

        assert_eq!(codec.verify_access(&token), Err(TokenError::Invalid));
    }
}
