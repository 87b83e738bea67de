/// Verification code model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What a one-time code authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "verification_code_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationCodeKind {
    EmailVerification,
    PasswordReset,
}

/// Single-use, time-boxed authorization for one action. The row id is
/// the code itself; consumption deletes the row.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: VerificationCodeKind,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
