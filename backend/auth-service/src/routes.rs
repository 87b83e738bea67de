/// Route table and shared application state.
use axum::http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, oauth, session, user};
use crate::services::{AuthService, OAuthRegistry};

pub const API_BASE: &str = "/api/v1";

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub oauth: OAuthRegistry,
    pub secure_cookies: bool,
    /// Public origin of the frontend, for OAuth redirects and CORS.
    pub origin: String,
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", get(auth::refresh))
        .route("/logout", get(auth::logout))
        .route("/email/verify/:code", get(auth::verify_email))
        .route("/password/forgot", post(auth::forgot_password))
        .route("/password/reset", post(auth::reset_password))
        .route("/:provider", get(oauth::oauth_start))
        .route("/:provider/callback", get(oauth::oauth_callback));

    let session_routes = Router::new()
        .route("/", get(session::list_sessions))
        .route("/:id", delete(session::delete_session));

    let user_routes = Router::new()
        .route("/me", get(user::me))
        .route("/", get(user::list_users));

    let cors = match state.origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, COOKIE])
            .allow_credentials(true),
        Err(_) => CorsLayer::new(),
    };

    Router::new()
        .nest(&format!("{}/auth", API_BASE), auth_routes)
        .nest(&format!("{}/sessions", API_BASE), session_routes)
        .nest(&format!("{}/user", API_BASE), user_routes)
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
