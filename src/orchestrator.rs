//! The credential and token state machine.
//!
//! `Authenticator` composes the stores, the credential hasher, the token
//! generator, and the email capability into the register / login / verify /
//! reset flows. Per account the states are Unregistered ->
//! Registered-Unverified -> Registered-Verified, with an orthogonal
//! reset-pending sub-flow that never touches the verification state.
//!
//! Every mutating operation acquires exactly one storage transaction; token
//! consumption and its paired account mutation commit together or not at all.
//! Email dispatch happens after commit and is best-effort: a transport
//! failure downgrades the outcome, it never rolls back committed state.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqlitePool;

use crate::configuration::SecuritySettings;
use crate::email::EmailCapability;
use crate::error::AppError;
use crate::models::TokenKind;
use crate::security::{expiry_from_now, hash_password, new_opaque_token, verify_password};
use crate::session::Session;
use crate::store::{accounts, tokens};
use crate::validators::{
    normalize_email, validate_confirmation, validate_email, validate_password_strength,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// User-facing message with an explicit severity, so callers pattern-match
/// instead of comparing string tags.
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub severity: Severity,
    pub message: String,
}

impl Feedback {
    fn new(severity: Severity, message: &str) -> Self {
        Self {
            severity,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// No email transport configured: the account starts verified so the
    /// system stays usable without SMTP.
    AutoVerified,
    VerificationSent,
    /// The account exists and the token is issued, but delivery failed.
    VerificationEmailFailed,
}

impl RegisterOutcome {
    pub fn feedback(&self) -> Feedback {
        match self {
            RegisterOutcome::AutoVerified => {
                Feedback::new(Severity::Success, "Account created! You can now log in.")
            }
            RegisterOutcome::VerificationSent => Feedback::new(
                Severity::Success,
                "Account created! Please check your email to verify your account.",
            ),
            RegisterOutcome::VerificationEmailFailed => Feedback::new(
                Severity::Warning,
                "Account created but we couldn't send the verification email. Please contact support.",
            ),
        }
    }
}

/// Four mutually exclusive results of presenting a verification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    /// Token already consumed. Informational, not a failure.
    AlreadyVerified,
    Expired,
    Invalid,
}

impl VerifyOutcome {
    pub fn feedback(&self) -> Feedback {
        match self {
            VerifyOutcome::Verified => Feedback::new(
                Severity::Success,
                "Email verified successfully! You can now log in.",
            ),
            VerifyOutcome::AlreadyVerified => Feedback::new(
                Severity::Info,
                "This email has already been verified. Please log in.",
            ),
            VerifyOutcome::Expired => Feedback::new(
                Severity::Error,
                "This verification link has expired. Please request a new one.",
            ),
            VerifyOutcome::Invalid => {
                Feedback::new(Severity::Error, "Invalid verification link.")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    Sent,
    AlreadyVerified,
    /// Discloses that no account exists. The forgot-password path deliberately
    /// does not; the mismatch is inherited behavior, kept until the intended
    /// security posture is confirmed.
    NoSuchAccount,
    SendFailed,
}

impl ResendOutcome {
    pub fn feedback(&self) -> Feedback {
        match self {
            ResendOutcome::Sent => Feedback::new(
                Severity::Success,
                "Verification email sent! Please check your inbox.",
            ),
            ResendOutcome::AlreadyVerified => Feedback::new(
                Severity::Info,
                "This account is already verified. Please log in.",
            ),
            ResendOutcome::NoSuchAccount => {
                Feedback::new(Severity::Error, "No account found with this email")
            }
            ResendOutcome::SendFailed => Feedback::new(
                Severity::Error,
                "Failed to send verification email. Please try again later.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgotOutcome {
    /// Returned whether or not the account exists.
    Accepted,
    SendFailed,
}

impl ForgotOutcome {
    pub fn feedback(&self) -> Feedback {
        match self {
            ForgotOutcome::Accepted => Feedback::new(
                Severity::Success,
                "If an account with this email exists, you will receive a password reset link.",
            ),
            ForgotOutcome::SendFailed => Feedback::new(
                Severity::Error,
                "Failed to send email. Please try again later.",
            ),
        }
    }
}

/// Non-consuming check of a reset token, so a caller can decide whether to
/// offer the new-password step at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTokenGate {
    Usable,
    Invalid,
    Expired,
    AlreadyUsed,
}

impl ResetTokenGate {
    pub fn is_usable(&self) -> bool {
        matches!(self, ResetTokenGate::Usable)
    }

    pub fn feedback(&self) -> Feedback {
        match self {
            ResetTokenGate::Usable => Feedback::new(
                Severity::Info,
                "This reset link is valid. Choose a new password.",
            ),
            ResetTokenGate::Invalid => {
                Feedback::new(Severity::Error, "Invalid password reset link.")
            }
            ResetTokenGate::Expired => Feedback::new(
                Severity::Error,
                "This password reset link has expired. Please request a new one.",
            ),
            ResetTokenGate::AlreadyUsed => Feedback::new(
                Severity::Info,
                "This password reset link has already been used.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    PasswordChanged,
    AlreadyUsed,
    Expired,
    Invalid,
}

impl ResetOutcome {
    pub fn feedback(&self) -> Feedback {
        match self {
            ResetOutcome::PasswordChanged => Feedback::new(
                Severity::Success,
                "Password reset successfully! You can now log in with your new password.",
            ),
            ResetOutcome::AlreadyUsed => Feedback::new(
                Severity::Info,
                "This password reset link has already been used.",
            ),
            ResetOutcome::Expired => Feedback::new(
                Severity::Error,
                "This password reset link has expired. Please request a new one.",
            ),
            ResetOutcome::Invalid => {
                Feedback::new(Severity::Error, "Invalid password reset link.")
            }
        }
    }
}

#[derive(Clone)]
pub struct Authenticator {
    pool: SqlitePool,
    mailer: Arc<dyn EmailCapability>,
    security: SecuritySettings,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, mailer: Arc<dyn EmailCapability>, security: SecuritySettings) -> Self {
        Self {
            pool,
            mailer,
            security,
        }
    }

    pub fn security(&self) -> &SecuritySettings {
        &self.security
    }

    /// Register a new account.
    ///
    /// Validates email syntax, password strength, and confirmation, in that
    /// order, reporting the first violated rule. Without an email transport
    /// the account starts verified; otherwise a verification token is issued
    /// in the same transaction as the account and mailed after commit.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<RegisterOutcome, AppError> {
        let email = validate_email(email)?;
        validate_password_strength(password)?;
        validate_confirmation(password, confirm)?;

        let password_hash = hash_password(password, self.security.bcrypt_cost)?;

        if !self.mailer.is_configured() {
            let account = accounts::create(&self.pool, &email, &password_hash, true).await?;
            tracing::info!(account_id = %account.id, "Account registered (auto-verified)");
            return Ok(RegisterOutcome::AutoVerified);
        }

        let mut tx = self.pool.begin().await?;
        let account = accounts::create(&mut tx, &email, &password_hash, false).await?;
        let raw_token = new_opaque_token();
        let expires_at = expiry_from_now(self.security.token_expiry_hours);
        tokens::issue(&mut tx, TokenKind::Verification, &account.id, &raw_token, expires_at)
            .await?;
        tx.commit().await?;

        tracing::info!(account_id = %account.id, "Account registered, verification pending");

        match self.mailer.send_verification(&account.email, &raw_token).await {
            Ok(()) => Ok(RegisterOutcome::VerificationSent),
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "Verification email not sent");
                Ok(RegisterOutcome::VerificationEmailFailed)
            }
        }
    }

    /// Authenticate and open a session.
    ///
    /// A missing account and a wrong password are indistinguishable to the
    /// caller. Verification status is not checked here; the gate handles it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);

        let account = accounts::find_by_email(&self.pool, &email).await?;
        let mut account = match account {
            Some(account) if verify_password(password, &account.password_hash) => account,
            _ => return Err(AppError::InvalidCredentials),
        };

        let now = Utc::now();
        accounts::touch_last_login(&self.pool, &account.id, now).await?;
        account.last_login = Some(now);

        tracing::info!(account_id = %account.id, "Login succeeded");
        Ok(Session::from_account(&account))
    }

    /// Consume a verification token handed in from its carrier.
    ///
    /// The caller clears the carrier exactly once after this returns,
    /// whatever the outcome, so a refresh cannot re-trigger consumption.
    pub async fn consume_verification_token(
        &self,
        raw_token: &str,
    ) -> Result<VerifyOutcome, AppError> {
        let token =
            match tokens::find_by_value(&self.pool, TokenKind::Verification, raw_token).await? {
                None => return Ok(VerifyOutcome::Invalid),
                Some(token) => token,
            };

        if token.is_used() {
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        let now = Utc::now();
        if token.is_expired(now) {
            return Ok(VerifyOutcome::Expired);
        }

        let mut tx = self.pool.begin().await?;
        if !tokens::consume(&mut tx, TokenKind::Verification, &token.id, now).await? {
            // Lost a race with a concurrent consumption; nothing to commit.
            return Ok(VerifyOutcome::AlreadyVerified);
        }
        accounts::mark_verified(&mut tx, &token.account_id).await?;
        tx.commit().await?;

        tracing::info!(account_id = %token.account_id, "Email verified");
        Ok(VerifyOutcome::Verified)
    }

    /// Issue a fresh verification token for an unverified account.
    /// Unavailable without an email transport, uniformly for every address.
    pub async fn resend_verification(&self, email: &str) -> Result<ResendOutcome, AppError> {
        if !self.mailer.is_configured() {
            return Ok(ResendOutcome::SendFailed);
        }

        let email = normalize_email(email);

        let account = match accounts::find_by_email(&self.pool, &email).await? {
            None => return Ok(ResendOutcome::NoSuchAccount),
            Some(account) => account,
        };

        if account.is_verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        let raw_token = new_opaque_token();
        let expires_at = expiry_from_now(self.security.token_expiry_hours);
        tokens::issue(&self.pool, TokenKind::Verification, &account.id, &raw_token, expires_at)
            .await?;

        match self.mailer.send_verification(&account.email, &raw_token).await {
            Ok(()) => Ok(ResendOutcome::Sent),
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "Resend email not sent");
                Ok(ResendOutcome::SendFailed)
            }
        }
    }

    /// Start the password-reset sub-flow. The external outcome does not
    /// reveal whether the account exists; a reset token is issued only
    /// internally when it does. Without an email transport no account lookup
    /// happens at all: every address gets the same accepted answer, so the
    /// send-failure branch cannot become an existence oracle.
    pub async fn forgot_password(&self, email: &str) -> Result<ForgotOutcome, AppError> {
        if !self.mailer.is_configured() {
            return Ok(ForgotOutcome::Accepted);
        }

        let email = normalize_email(email);

        let account = match accounts::find_by_email(&self.pool, &email).await? {
            None => return Ok(ForgotOutcome::Accepted),
            Some(account) => account,
        };

        let raw_token = new_opaque_token();
        let expires_at = expiry_from_now(self.security.token_expiry_hours);
        tokens::issue(&self.pool, TokenKind::Reset, &account.id, &raw_token, expires_at).await?;

        match self.mailer.send_password_reset(&account.email, &raw_token).await {
            Ok(()) => Ok(ForgotOutcome::Accepted),
            Err(e) => {
                tracing::warn!(account_id = %account.id, error = %e, "Reset email not sent");
                Ok(ForgotOutcome::SendFailed)
            }
        }
    }

    /// Validate a reset token without consuming it.
    pub async fn inspect_reset_token(&self, raw_token: &str) -> Result<ResetTokenGate, AppError> {
        let token = match tokens::find_by_value(&self.pool, TokenKind::Reset, raw_token).await? {
            None => return Ok(ResetTokenGate::Invalid),
            Some(token) => token,
        };

        if token.is_used() {
            return Ok(ResetTokenGate::AlreadyUsed);
        }
        if token.is_expired(Utc::now()) {
            return Ok(ResetTokenGate::Expired);
        }
        Ok(ResetTokenGate::Usable)
    }

    /// Consume a reset token and set the new password atomically.
    /// Does not log the caller in.
    pub async fn consume_reset_token(
        &self,
        raw_token: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<ResetOutcome, AppError> {
        validate_password_strength(new_password)?;
        validate_confirmation(new_password, confirm)?;

        let token = match tokens::find_by_value(&self.pool, TokenKind::Reset, raw_token).await? {
            None => return Ok(ResetOutcome::Invalid),
            Some(token) => token,
        };

        if token.is_used() {
            return Ok(ResetOutcome::AlreadyUsed);
        }

        let now = Utc::now();
        if token.is_expired(now) {
            return Ok(ResetOutcome::Expired);
        }

        let password_hash = hash_password(new_password, self.security.bcrypt_cost)?;

        let mut tx = self.pool.begin().await?;
        if !tokens::consume(&mut tx, TokenKind::Reset, &token.id, now).await? {
            return Ok(ResetOutcome::AlreadyUsed);
        }
        accounts::update_password_hash(&mut tx, &token.account_id, &password_hash).await?;
        tx.commit().await?;

        tracing::info!(account_id = %token.account_id, "Password reset");
        Ok(ResetOutcome::PasswordChanged)
    }

    /// Discard a session. Sessions are caller-held values; the server keeps
    /// no revocation list, so the discard itself happens at the client.
    pub fn logout(&self, session: Session) {
        tracing::info!(account_id = %session.account_id, "Logout");
        drop(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_severities_match_the_outcome_class() {
        assert_eq!(VerifyOutcome::Verified.feedback().severity, Severity::Success);
        assert_eq!(VerifyOutcome::AlreadyVerified.feedback().severity, Severity::Info);
        assert_eq!(VerifyOutcome::Expired.feedback().severity, Severity::Error);
        assert_eq!(VerifyOutcome::Invalid.feedback().severity, Severity::Error);
        assert_eq!(
            RegisterOutcome::VerificationEmailFailed.feedback().severity,
            Severity::Warning
        );
    }

    #[test]
    fn forgot_password_accepted_message_never_confirms_existence() {
        let message = ForgotOutcome::Accepted.feedback().message;
        assert!(message.starts_with("If an account with this email exists"));
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Warning).unwrap(),
            "\"warning\""
        );
    }
}
