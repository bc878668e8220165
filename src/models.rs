//! Persisted records: accounts, verification/reset tokens, scenarios.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered identity. `password_hash` is produced only by the credential
/// hasher and never leaves the store layer in responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// The two single-use token flows. Same record shape, separate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Verification,
    Reset,
}

impl TokenKind {
    pub fn table(&self) -> &'static str {
        match self {
            TokenKind::Verification => "verification_tokens",
            TokenKind::Reset => "password_reset_tokens",
        }
    }
}

/// A single-use, time-boxed token bound to one account.
///
/// `unused -> used` happens exactly once and never reverses. Expired-unused
/// tokens stay queryable for user-facing messaging but never authorize.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub id: String,
    pub account_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }
}

/// A named, owner-scoped snapshot of projection overrides.
/// Name uniqueness is per owner; different accounts may reuse a name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Scenario {
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub base_currency: String,
    /// Opaque JSON object, stored as text.
    pub overrides: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Scenario {
    /// Parse the stored overrides. An empty or corrupt value decodes to `{}`.
    pub fn overrides_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.overrides)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}
