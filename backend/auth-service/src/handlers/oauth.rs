/// OAuth redirect flow handlers.
///
/// `GET /:provider` bounces the browser to the provider's consent
/// screen; `GET /:provider/callback` exchanges the code, logs the user
/// in (creating the account on first contact), sets cookies, and sends
/// the browser back to the app. Failures redirect to the app's login
/// page with the message in the query string, since the caller here is
/// a browser mid-redirect, not an API client.
use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::header::{HeaderMap, USER_AGENT};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::warn;

use crate::cookies::set_auth_cookies;
use crate::error::{AuthError, Result};
use crate::models::OAuthProvider;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

fn parse_provider(raw: &str) -> Result<OAuthProvider> {
    let provider = OAuthProvider::from_str(raw)
        .map_err(|_| AuthError::OAuth(format!("unknown provider: {}", raw)))?;
    if provider == OAuthProvider::Email {
        return Err(AuthError::OAuth("unknown provider: email".to_string()));
    }
    Ok(provider)
}

pub async fn oauth_start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Redirect> {
    let provider = parse_provider(&provider)?;
    let url = state.oauth.get(provider)?.authorize_url()?;
    Ok(Redirect::to(&url))
}

pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    match callback_inner(&state, &provider, query, &headers).await {
        Ok(response) => response,
        Err(err) => {
            warn!(%provider, error = %err, "oauth callback failed");
            let target = format!(
                "{}/login?error={}",
                state.origin,
                urlencoding::encode(&err.to_string())
            );
            Redirect::to(&target).into_response()
        }
    }
}

async fn callback_inner(
    state: &AppState,
    provider: &str,
    query: CallbackQuery,
    headers: &HeaderMap,
) -> Result<Response> {
    let provider = parse_provider(provider)?;
    if let Some(error) = query.error {
        return Err(AuthError::OAuth(format!("provider returned: {}", error)));
    }
    let code = query
        .code
        .ok_or_else(|| AuthError::OAuth("callback missing code".to_string()))?;

    let email = state.oauth.get(provider)?.resolve_email(&code).await?;
    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let bundle = state.auth.oauth_login(provider, &email, user_agent).await?;

    let mut response = Redirect::to(&format!("{}/", state.origin)).into_response();
    set_auth_cookies(
        response.headers_mut(),
        &bundle.access_token,
        &bundle.refresh_token,
        state.secure_cookies,
    );
    Ok(response)
}
