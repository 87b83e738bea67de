/// Request extractors for authenticated routes.
///
/// [`Authenticated`] reads the access-token cookie and verifies it
/// against the session store; handlers that take it as an argument are
/// protected. [`AdminOnly`] additionally requires the admin role.
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::cookies::{extract_cookie, ACCESS_TOKEN_COOKIE};
use crate::error::AuthError;
use crate::models::Role;
use crate::routes::AppState;
use crate::services::AuthContext;

pub struct Authenticated(pub AuthContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_cookie(&parts.headers, ACCESS_TOKEN_COOKIE)
            .ok_or(AuthError::NotAuthenticated)?;
        let context = state.auth.authenticate(&token).await?;
        Ok(Authenticated(context))
    }
}

pub struct AdminOnly(pub AuthContext);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Authenticated(context) = Authenticated::from_request_parts(parts, state).await?;
        if context.role != Role::Admin {
            return Err(AuthError::Forbidden);
        }
        Ok(AdminOnly(context))
    }
}
