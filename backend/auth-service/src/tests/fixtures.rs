/// In-memory test doubles for the store, mailer, and clock contracts.
///
/// Each store mirrors the semantics its Postgres counterpart gets from
/// SQL (unique email, owner-scoped deletes, expiry filters) so the auth
/// core behaves identically over either backing.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::models::{NewUser, Session, User, VerificationCode, VerificationCodeKind};
use crate::security::jwt::TokenCodec;
use crate::services::email::{EmailMessage, Mailer};
use crate::services::AuthService;
use crate::store::{SessionStore, UserStore, VerificationCodeStore};
use crate::time::Clock;

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Anchored at the real present so token exp claims, which the JWT
    /// library checks against the system clock, stay in the future.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    clock: Arc<FixedClock>,
}

impl InMemoryUserStore {
    pub fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            clock,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.email == email))
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailInUse);
        }
        let now = self.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            verified: false,
            role: crate::models::Role::User,
            oauth_provider: new_user.oauth_provider,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.password_hash = Some(password_hash.to_string());
        user.updated_at = self.clock.now();
        Ok(Some(user.clone()))
    }

    async fn set_verified(&self, id: Uuid) -> Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.verified = true;
        user.updated_at = self.clock.now();
        Ok(Some(user.clone()))
    }

    async fn count_all(&self) -> Result<i64> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn list_page(&self, limit: i64, offset: i64) -> Result<Vec<User>> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

pub struct InMemorySessionStore {
    sessions: Mutex<Vec<Session>>,
    clock: Arc<FixedClock>,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            clock,
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        user_id: Uuid,
        user_agent: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            user_agent: user_agent.map(str::to_string),
            expires_at,
            created_at: self.clock.now(),
        };
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        self.sessions.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn update_expiry(&self, id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.iter_mut().find(|s| s.id == id) {
            session.expires_at = expires_at;
        }
        Ok(())
    }

    async fn list_active_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.expires_at > now)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| !(s.id == id && s.user_id == user_id));
        Ok(sessions.len() < before)
    }
}

pub struct InMemoryVerificationCodeStore {
    codes: Mutex<Vec<VerificationCode>>,
    clock: Arc<FixedClock>,
}

impl InMemoryVerificationCodeStore {
    pub fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            codes: Mutex::new(Vec::new()),
            clock,
        }
    }

    pub fn all(&self) -> Vec<VerificationCode> {
        self.codes.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationCodeStore for InMemoryVerificationCodeStore {
    async fn create(
        &self,
        user_id: Uuid,
        kind: VerificationCodeKind,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationCode> {
        let code = VerificationCode {
            id: Uuid::new_v4(),
            user_id,
            kind,
            expires_at,
            created_at: self.clock.now(),
        };
        self.codes.lock().unwrap().push(code.clone());
        Ok(code)
    }

    async fn find_active_by_id(
        &self,
        id: Uuid,
        kind: VerificationCodeKind,
        now: DateTime<Utc>,
    ) -> Result<Option<VerificationCode>> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id && c.kind == kind && c.expires_at > now)
            .cloned())
    }

    async fn count_for_user_since(
        &self,
        user_id: Uuid,
        kind: VerificationCodeKind,
        since: DateTime<Utc>,
    ) -> Result<i64> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id && c.kind == kind && c.created_at > since)
            .count() as i64)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        self.codes.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

/// Captures outbound mail instead of sending it. Flip `fail` to make
/// every send error.
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_sent(&self) -> Option<EmailMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::EmailDelivery("smtp unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(Uuid::new_v4().to_string())
    }
}

pub const TEST_ORIGIN: &str = "https://app.test";

/// An [`AuthService`] over in-memory backings, with handles to every
/// double kept so tests can inspect and manipulate them.
pub struct TestService {
    pub auth: AuthService,
    pub users: Arc<InMemoryUserStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub codes: Arc<InMemoryVerificationCodeStore>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<FixedClock>,
    pub codec: TokenCodec,
}

pub fn test_service() -> TestService {
    let clock = Arc::new(FixedClock::new());
    let users = Arc::new(InMemoryUserStore::new(clock.clone()));
    let sessions = Arc::new(InMemorySessionStore::new(clock.clone()));
    let codes = Arc::new(InMemoryVerificationCodeStore::new(clock.clone()));
    let mailer = Arc::new(RecordingMailer::new());
    let codec = TokenCodec::new("test-access-secret", "test-refresh-secret", "auth-service");

    let auth = AuthService::new(
        users.clone(),
        sessions.clone(),
        codes.clone(),
        mailer.clone(),
        codec.clone(),
        clock.clone(),
        TEST_ORIGIN.to_string(),
    );

    TestService {
        auth,
        users,
        sessions,
        codes,
        mailer,
        clock,
        codec,
    }
}
