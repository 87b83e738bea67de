/// HTTP handlers for the auth lifecycle: register, login, refresh,
/// logout, email verification, and the password-reset pair.
///
/// Handlers validate input, call into [`AuthService`], and translate
/// the outcome into status codes and cookies. Body field names follow
/// the frontend's camelCase convention.
use axum::extract::{Path, State};
use axum::http::header::{HeaderMap, USER_AGENT};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::cookies::{
    clear_auth_cookies, extract_cookie, set_access_cookie, set_auth_cookies, set_refresh_cookie,
    ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::error::{AuthError, Result};
use crate::models::UserResponse;
use crate::routes::AppState;
use crate::services::auth::{LoginParams, RegisterParams};
use crate::services::LogoutOutcome;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 255, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 255, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub verification_code: Uuid,
    #[validate(length(min = 6, max = 255, message = "Password must be at least 6 characters"))]
    pub password: String,
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<Response> {
    body.validate()?;

    let bundle = state
        .auth
        .register(RegisterParams {
            email: body.email,
            password: body.password,
            user_agent: user_agent(&headers),
        })
        .await?;

    let mut response = (
        StatusCode::CREATED,
        Json(UserResponse::from(bundle.user)),
    )
        .into_response();
    set_auth_cookies(
        response.headers_mut(),
        &bundle.access_token,
        &bundle.refresh_token,
        state.secure_cookies,
    );
    Ok(response)
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    body.validate()?;

    let bundle = state
        .auth
        .login(LoginParams {
            email: body.email,
            password: body.password,
            user_agent: user_agent(&headers),
        })
        .await?;

    let mut response = Json(json!({ "message": "Login successful." })).into_response();
    set_auth_cookies(
        response.headers_mut(),
        &bundle.access_token,
        &bundle.refresh_token,
        state.secure_cookies,
    );
    Ok(response)
}

/// Any refresh failure clears both cookies so a broken client state
/// cannot loop on a dead token.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = match extract_cookie(&headers, REFRESH_TOKEN_COOKIE) {
        Some(token) => state.auth.refresh_access_token(&token).await,
        None => Err(AuthError::MissingRefreshToken),
    };

    match result {
        Ok(tokens) => {
            let mut response =
                Json(json!({ "message": "Access token refreshed." })).into_response();
            set_access_cookie(
                response.headers_mut(),
                &tokens.access_token,
                state.secure_cookies,
            );
            if let Some(refresh_token) = &tokens.new_refresh_token {
                set_refresh_cookie(response.headers_mut(), refresh_token, state.secure_cookies);
            }
            response
        }
        Err(err) => {
            let mut response = err.into_response();
            clear_auth_cookies(response.headers_mut(), state.secure_cookies);
            response
        }
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    let token = extract_cookie(&headers, ACCESS_TOKEN_COOKIE);
    let outcome = state.auth.logout(token.as_deref()).await?;

    match outcome {
        LogoutOutcome::LoggedOut => {
            let mut response = Json(json!({ "message": "Logout successful." })).into_response();
            clear_auth_cookies(response.headers_mut(), state.secure_cookies);
            Ok(response)
        }
        LogoutOutcome::NotAuthenticated => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authenticated." })),
        )
            .into_response()),
    }
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path(code): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    state.auth.verify_email(code).await?;
    Ok(Json(json!({ "message": "Email successfully verified." })))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    body.validate()?;
    state.auth.send_password_reset_email(&body.email).await?;
    Ok(Json(json!({ "message": "Password reset email sent." })))
}

/// Resetting a password revokes every session, so the caller's own
/// cookies are cleared too.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Response> {
    body.validate()?;
    state
        .auth
        .reset_password(body.verification_code, &body.password)
        .await?;

    let mut response = Json(json!({ "message": "Password reset successful." })).into_response();
    clear_auth_cookies(response.headers_mut(), state.secure_cookies);
    Ok(response)
}
