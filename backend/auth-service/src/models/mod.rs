pub mod session;
pub mod user;
pub mod verification_code;

pub use session::{Session, SessionSummary};
pub use user::{NewUser, OAuthProvider, Role, User, UserResponse};
pub use verification_code::{VerificationCode, VerificationCodeKind};
