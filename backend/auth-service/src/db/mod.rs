/// Postgres store implementations (sqlx)
pub mod sessions;
pub mod users;
pub mod verification_codes;

pub use sessions::PgSessionStore;
pub use users::PgUserStore;
pub use verification_codes::PgVerificationCodeStore;
