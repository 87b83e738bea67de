/// Business logic
///
/// - `auth`: session/token lifecycle core
/// - `email`: outbound mail (SMTP via lettre, no-op mode for dev)
/// - `oauth`: provider identity resolution for OAuth logins
pub mod auth;
pub mod email;
pub mod oauth;

pub use auth::{AuthContext, AuthService, LogoutOutcome};
pub use email::{EmailMessage, Mailer, SmtpMailer};
pub use oauth::{OAuthClient, OAuthRegistry};
