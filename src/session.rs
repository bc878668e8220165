//! Client sessions.
//!
//! A `Session` is a snapshot of an account's public fields taken at login or
//! last refresh. It is a cache, not a source of truth: verification status is
//! re-read from the account store after any token-consuming operation that
//! could have changed it. Sessions are explicit values handed to each
//! operation, never process-wide state, so concurrent clients cannot observe
//! each other.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

use chrono::{DateTime, Utc};

use crate::configuration::SecuritySettings;
use crate::error::AppError;
use crate::models::Account;

/// JWT payload carrying the session snapshot plus standard claims (RFC 7519).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: account id.
    pub sub: String,
    pub email: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    pub iss: String,
}

/// Snapshot of the authenticated account's public fields.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub account_id: String,
    pub email: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Session {
    pub fn from_account(account: &Account) -> Self {
        Self {
            account_id: account.id.clone(),
            email: account.email.clone(),
            is_verified: account.is_verified,
            created_at: account.created_at,
            last_login: account.last_login,
        }
    }

    /// Sign the snapshot into a bearer token.
    pub fn token(&self, settings: &SecuritySettings) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: self.account_id.clone(),
            email: self.email.clone(),
            verified: self.is_verified,
            created_at: self.created_at,
            last_login: self.last_login,
            exp: now + settings.session_expiry_hours * 3600,
            iat: now,
            iss: settings.issuer.clone(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(settings.session_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Session token generation failed: {}", e)))
    }

    /// Decode and validate a bearer token back into a session snapshot.
    /// Expiry and issuer are both checked; any failure is `SessionInvalid`.
    pub fn from_token(token: &str, settings: &SecuritySettings) -> Result<Self, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&settings.issuer]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(settings.session_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!("Session token validation failed: {}", e);
            AppError::SessionInvalid
        })?;

        Ok(Self {
            account_id: claims.sub,
            email: claims.email,
            is_verified: claims.verified,
            created_at: claims.created_at,
            last_login: claims.last_login,
        })
    }

    /// Re-read the account and return a fresh snapshot. A session whose
    /// account has vanished is treated as invalid.
    pub async fn refresh(&self, pool: &SqlitePool) -> Result<Self, AppError> {
        let account = crate::store::accounts::find_by_id(pool, &self.account_id)
            .await?
            .ok_or(AppError::SessionInvalid)?;

        Ok(Self::from_account(&account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> SecuritySettings {
        SecuritySettings {
            session_secret: "test-secret-key-at-least-32-characters-long".to_string(),
            session_expiry_hours: 1,
            issuer: "test".to_string(),
            bcrypt_cost: 4,
            token_expiry_hours: 24,
        }
    }

    fn test_session() -> Session {
        Session {
            account_id: uuid::Uuid::new_v4().to_string(),
            email: "alice@example.com".to_string(),
            is_verified: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn token_round_trips_the_snapshot() {
        let settings = test_settings();
        let session = test_session();

        let token = session.token(&settings).expect("Failed to sign session");
        let decoded = Session::from_token(&token, &settings).expect("Failed to decode session");

        assert_eq!(decoded.account_id, session.account_id);
        assert_eq!(decoded.email, session.email);
        assert!(decoded.is_verified);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let result = Session::from_token("not.a.token", &test_settings());
        assert!(matches!(result, Err(AppError::SessionInvalid)));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let settings = test_settings();
        let token = test_session().token(&settings).expect("Failed to sign session");

        let tampered = format!("{}x", token);
        assert!(Session::from_token(&tampered, &settings).is_err());
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let mut settings = test_settings();
        let token = test_session().token(&settings).expect("Failed to sign session");

        settings.issuer = "someone-else".to_string();
        assert!(Session::from_token(&token, &settings).is_err());
    }
}
