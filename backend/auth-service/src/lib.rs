/// Auth Service Library
///
/// Credential and session management: email/password and OAuth login,
/// cookie-borne JWT pairs backed by server-side sessions, email
/// verification, and password reset.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `cookies`: Token cookie handling
/// - `db`: Database repositories (users, sessions, verification codes)
/// - `error`: Error types
/// - `handlers`: HTTP handlers
/// - `middleware`: Authentication extractors
/// - `models`: Data models
/// - `routes`: Route table and shared state
/// - `security`: JWT codec and password hashing
/// - `services`: Business logic (auth core, email, oauth)
/// - `store`: Store contracts
/// - `time`: Injectable clock
pub mod config;
pub mod cookies;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod store;
pub mod time;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use error::{AuthError, Result};
pub use routes::{build_router, AppState};
