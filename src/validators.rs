//! Input validation for registration and password changes.
//!
//! The first violated rule is reported; callers surface it verbatim.

use crate::error::ValidationError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lowercase and trim an email for lookup and storage. All stored emails go
/// through this, so case/whitespace variants collide on the unique constraint.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email syntax and return the normalized form.
///
/// Accepts exactly one `@` with non-empty local and domain parts and at least
/// one `.` in the domain. Deliverability is the mail transport's problem.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let normalized = normalize_email(email);

    if normalized.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    let mut parts = normalized.splitn(3, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next();
    let extra = parts.next();

    match (domain, extra) {
        (Some(domain), None) if !local.is_empty() && !domain.is_empty() && domain.contains('.') => {
            Ok(normalized)
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}

/// Minimum 8 characters, at least one letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(ValidationError::PasswordNeedsLetter);
    }

    if !password.chars().any(|c| c.is_numeric()) {
        return Err(ValidationError::PasswordNeedsDigit);
    }

    Ok(())
}

pub fn validate_confirmation(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
