pub mod auth;
pub mod oauth;
pub mod session;
pub mod user;
