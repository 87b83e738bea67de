/// Store contracts the auth core depends on
///
/// The core never talks to Postgres directly; it composes these traits.
/// Production implementations live in `db` (sqlx repositories), test
/// doubles in `tests::fixtures`. Every operation is atomic per row;
/// no contract requires holding state across calls.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewUser, Session, User, VerificationCode, VerificationCodeKind};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Insert a new user. The unique constraint on email is the arbiter
    /// under concurrent registration: a duplicate insert must surface as
    /// `AuthError::EmailInUse`, never as a generic database fault.
    async fn create(&self, new_user: NewUser) -> Result<User>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<Option<User>>;
    async fn set_verified(&self, id: Uuid) -> Result<Option<User>>;

    async fn count_all(&self) -> Result<i64>;
    async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<User>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>>;

    /// Idempotent: deleting an absent session is a no-op, not an error.
    async fn delete_by_id(&self, id: Uuid) -> Result<()>;

    /// Global invalidation for a user; returns how many sessions went away.
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64>;

    async fn update_expiry(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<()>;

    /// Unexpired sessions for a user, newest first.
    async fn list_active_for_user(&self, user_id: Uuid, now: DateTime<Utc>)
        -> Result<Vec<Session>>;

    /// Delete a session only when owned by the given user. Returns
    /// whether a row was removed.
    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        kind: VerificationCodeKind,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCode>;

    /// Look up an unconsumed code of the expected kind; `None` when
    /// absent, of the wrong kind, or already expired at `now`.
    async fn find_active_by_id(
        &self,
        id: Uuid,
        kind: VerificationCodeKind,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>>;

    /// Count codes of a kind created for a user since `since`. Drives
    /// the password-reset throttle.
    async fn count_for_user_since(
        &self,
        user_id: Uuid,
        kind: VerificationCodeKind,
        since: DateTime<Utc>,
    ) -> Result<i64>;

    async fn delete_by_id(&self, id: Uuid) -> Result<()>;
}
