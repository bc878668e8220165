//! Unified error handling.
//!
//! Domain-specific error enums feed a single `AppError` that maps onto HTTP
//! responses with a structured JSON body. Security-sensitive lookups never
//! surface a raw "not found": login failures collapse into
//! `InvalidCredentials`, and token lookups are reported through the
//! orchestrator's outcome enums instead of errors.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for user-supplied input. Always locally recoverable and
/// surfaced verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    InvalidEmail,
    PasswordNeedsLetter,
    PasswordNeedsDigit,
    PasswordMismatch,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            ValidationError::InvalidEmail => write!(f, "Please enter a valid email address"),
            ValidationError::PasswordNeedsLetter => {
                write!(f, "Password must contain at least one letter")
            }
            ValidationError::PasswordNeedsDigit => {
                write!(f, "Password must contain at least one number")
            }
            ValidationError::PasswordMismatch => write!(f, "Passwords do not match"),
        }
    }
}

impl StdError for ValidationError {}

/// Email transport errors. Never fatal to already-committed account or token
/// state; the caller is told delivery failed and may re-issue a token.
#[derive(Debug, Clone)]
pub enum EmailError {
    SendFailed(String),
    NotConfigured,
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailError::SendFailed(msg) => write!(f, "Failed to send email: {}", msg),
            EmailError::NotConfigured => write!(f, "Email transport is not configured"),
        }
    }
}

impl StdError for EmailError {}

/// Central error type for orchestrator operations and route handlers.
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    DuplicateEmail,
    InvalidCredentials,
    SessionInvalid,
    Email(EmailError),
    Storage(sqlx::Error),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::DuplicateEmail => write!(f, "An account with this email already exists"),
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::SessionInvalid => write!(f, "Invalid or expired session"),
            AppError::Email(e) => write!(f, "{}", e),
            AppError::Storage(e) => write!(f, "Storage error: {}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        AppError::Email(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err)
    }
}

/// Structured body returned for every error response.
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique id for correlating the response with server logs.
    pub error_id: String,
    pub message: String,
    /// Stable code for client-side handling.
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "DUPLICATE_EMAIL",
                self.to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                self.to_string(),
            ),
            AppError::SessionInvalid => (
                StatusCode::UNAUTHORIZED,
                "SESSION_INVALID",
                self.to_string(),
            ),
            AppError::Email(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "EMAIL_SERVICE_ERROR",
                "Email service temporarily unavailable".to_string(),
            ),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "Internal server error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    fn log(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::DuplicateEmail => {
                tracing::warn!(error_id = error_id, "Duplicate registration attempt");
            }
            AppError::InvalidCredentials => {
                tracing::warn!(error_id = error_id, "Invalid credentials attempt");
            }
            AppError::SessionInvalid => {
                tracing::warn!(error_id = error_id, "Rejected session token");
            }
            AppError::Email(e) => {
                tracing::error!(error_id = error_id, error = %e, "Email service error");
            }
            AppError::Storage(e) => {
                tracing::error!(error_id = error_id, error = %e, "Storage error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let (status, code, message) = self.parts();
        let body = ErrorResponse::new(error_id, message, code.to_string(), status.as_u16());
        HttpResponse::build(status).json(body)
    }
}
