/// Security primitives for the auth service
///
/// - **password**: Argon2id password hashing and verification
/// - **jwt**: access/refresh token signing and verification (HS256,
///   kind-specific secrets, fixed audience)
pub mod jwt;
pub mod password;

pub use jwt::{AccessClaims, RefreshClaims, TokenCodec, TokenError};
pub use password::{hash_password, verify_password};
