use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::models::OAuthProvider;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Machine-readable codes the frontend switches on, carried next to the
/// human-readable message in error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AppErrorCode {
    InvalidAccessToken,
    InsufficientRole,
    InvalidLoginMethod,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already in use.")]
    EmailInUse,

    #[error("Email already used with a different login method. Please use {provider} login.")]
    InvalidLoginMethod { provider: OAuthProvider },

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Refresh token is missing.")]
    MissingRefreshToken,

    #[error("Invalid refresh token.")]
    InvalidRefreshToken,

    #[error("Session expired.")]
    SessionExpired,

    #[error("Token expired.")]
    TokenExpired,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("Not authenticated.")]
    NotAuthenticated,

    #[error("Forbidden Request.")]
    Forbidden,

    #[error("Invalid or expired verification code.")]
    InvalidVerificationCode,

    #[error("User not found.")]
    UserNotFound,

    #[error("Session not found.")]
    SessionNotFound,

    #[error("No sessions found.")]
    NoSessionsFound,

    #[error("Too many requests, please try again later.")]
    TooManyRequests,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    #[error("OAuth provider error: {0}")]
    OAuth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::EmailInUse | AuthError::InvalidLoginMethod { .. } => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken
            | AuthError::SessionExpired
            | AuthError::TokenExpired
            | AuthError::InvalidToken
            | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InvalidVerificationCode
            | AuthError::UserNotFound
            | AuthError::SessionNotFound
            | AuthError::NoSessionsFound => StatusCode::NOT_FOUND,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailDelivery(_)
            | AuthError::OAuth(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> Option<AppErrorCode> {
        match self {
            AuthError::TokenExpired | AuthError::InvalidToken | AuthError::NotAuthenticated => {
                Some(AppErrorCode::InvalidAccessToken)
            }
            AuthError::Forbidden => Some(AppErrorCode::InsufficientRole),
            AuthError::InvalidLoginMethod { .. } => Some(AppErrorCode::InvalidLoginMethod),
            _ => None,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal failure details go to the log, not the client.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error.".to_string()
        } else {
            self.to_string()
        };

        let body = match self.error_code() {
            Some(code) => json!({ "message": message, "errorCode": code }),
            None => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}
