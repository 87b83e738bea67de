/// Time source abstraction
///
/// Every expiry decision in the auth core goes through an injected
/// `Clock`, so the sliding-window and throttle logic is deterministic
/// under test.
use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
