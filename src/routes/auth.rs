//! Authentication routes.
//!
//! Thin mapping from the orchestrator's outcomes onto HTTP. Token-carrying
//! URLs (`/auth/verify?token=`, `/auth/reset?token=`) are processed on every
//! outcome branch; stripping the token from the visible URL afterwards is the
//! client's side of the contract, exactly once per value, so a page refresh
//! cannot replay consumption.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::sqlite::SqlitePool;

use crate::error::AppError;
use crate::orchestrator::{
    Authenticator, ForgotOutcome, RegisterOutcome, ResendOutcome, ResetOutcome, VerifyOutcome,
};
use crate::session::Session;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// POST /auth/register
///
/// # Errors
/// - 400: first violated validation rule
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let outcome = authenticator
        .register(&form.email, &form.password, &form.confirm_password)
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "feedback": outcome.feedback(),
        "verification_pending": outcome == RegisterOutcome::VerificationSent
            || outcome == RegisterOutcome::VerificationEmailFailed,
    })))
}

/// POST /auth/login
///
/// Returns a signed session token plus the account snapshot. A missing
/// account and a wrong password produce the same 401.
pub async fn login(
    form: web::Json<LoginRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let session = authenticator.login(&form.email, &form.password).await?;
    let session_token = session.token(authenticator.security())?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session_token": session_token,
        "account": session,
    })))
}

/// GET /auth/verify?token=...
pub async fn verify_email(
    query: web::Query<TokenQuery>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let outcome = authenticator.consume_verification_token(&query.token).await?;

    let body = serde_json::json!({
        "feedback": outcome.feedback(),
        "verified": outcome == VerifyOutcome::Verified || outcome == VerifyOutcome::AlreadyVerified,
    });

    let response = match outcome {
        VerifyOutcome::Verified | VerifyOutcome::AlreadyVerified => HttpResponse::Ok().json(body),
        VerifyOutcome::Expired | VerifyOutcome::Invalid => HttpResponse::BadRequest().json(body),
    };
    Ok(response)
}

/// POST /auth/resend
///
/// Note: a missing account answers 404 here, unlike the forgot-password
/// path. Inherited behavior, kept deliberately.
pub async fn resend_verification(
    form: web::Json<EmailRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let outcome = authenticator.resend_verification(&form.email).await?;

    let body = serde_json::json!({ "feedback": outcome.feedback() });
    let response = match outcome {
        ResendOutcome::Sent | ResendOutcome::AlreadyVerified => HttpResponse::Ok().json(body),
        ResendOutcome::NoSuchAccount => HttpResponse::NotFound().json(body),
        ResendOutcome::SendFailed => HttpResponse::ServiceUnavailable().json(body),
    };
    Ok(response)
}

/// POST /auth/forgot
///
/// The 200 body is identical whether or not the account exists.
pub async fn forgot_password(
    form: web::Json<EmailRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let outcome = authenticator.forgot_password(&form.email).await?;

    let body = serde_json::json!({ "feedback": outcome.feedback() });
    let response = match outcome {
        ForgotOutcome::Accepted => HttpResponse::Ok().json(body),
        ForgotOutcome::SendFailed => HttpResponse::ServiceUnavailable().json(body),
    };
    Ok(response)
}

/// GET /auth/reset?token=...
///
/// Non-consuming check so a client knows whether to present the
/// new-password step.
pub async fn inspect_reset_token(
    query: web::Query<TokenQuery>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let gate = authenticator.inspect_reset_token(&query.token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "usable": gate.is_usable(),
        "feedback": gate.feedback(),
    })))
}

/// POST /auth/reset
pub async fn reset_password(
    form: web::Json<ResetRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let outcome = authenticator
        .consume_reset_token(&form.token, &form.new_password, &form.confirm_password)
        .await?;

    let body = serde_json::json!({ "feedback": outcome.feedback() });
    let response = match outcome {
        ResetOutcome::PasswordChanged => HttpResponse::Ok().json(body),
        ResetOutcome::AlreadyUsed => HttpResponse::Conflict().json(body),
        ResetOutcome::Expired | ResetOutcome::Invalid => HttpResponse::BadRequest().json(body),
    };
    Ok(response)
}

/// GET /api/me: the session snapshot the guard admitted.
pub async fn current_session(session: web::ReqData<Session>) -> HttpResponse {
    HttpResponse::Ok().json(session.into_inner())
}

/// POST /api/session/refresh
///
/// Re-reads the account and signs a fresh token; the snapshot in a session
/// token is a cache and goes stale across verification.
pub async fn refresh_session(
    session: web::ReqData<Session>,
    pool: web::Data<SqlitePool>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let fresh = session.refresh(pool.get_ref()).await?;
    let session_token = fresh.token(authenticator.security())?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "session_token": session_token,
        "account": fresh,
    })))
}

/// POST /api/logout
///
/// Sessions are caller-held values; the server keeps no revocation list.
/// The client discards the token together with any state keyed to it.
pub async fn logout(
    session: web::ReqData<Session>,
    authenticator: web::Data<Authenticator>,
) -> HttpResponse {
    authenticator.logout(session.into_inner());
    HttpResponse::NoContent().finish()
}
