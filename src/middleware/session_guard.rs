//! Session gate for protected routes.
//!
//! Every protected entry point re-checks the caller: a missing or invalid
//! bearer token is rejected outright, and a session whose snapshot says
//! unverified is re-read from the account store before deciding, since the
//! token is a cache and the account may have been verified after signing.
//! While the email capability is configured, an unverified caller gets
//! `VERIFY_REQUIRED` and can only resend the verification mail or log out.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use sqlx::sqlite::SqlitePool;
use std::rc::Rc;
use uuid::Uuid;

use crate::configuration::SecuritySettings;
use crate::error::ErrorResponse;
use crate::session::Session;

pub struct SessionGuard {
    pool: SqlitePool,
    security: SecuritySettings,
    email_configured: bool,
}

impl SessionGuard {
    pub fn new(pool: SqlitePool, security: SecuritySettings, email_configured: bool) -> Self {
        Self {
            pool,
            security,
            email_configured,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionGuardService {
            service: Rc::new(service),
            pool: self.pool.clone(),
            security: self.security.clone(),
            email_configured: self.email_configured,
        }))
    }
}

pub struct SessionGuardService<S> {
    service: Rc<S>,
    pool: SqlitePool,
    security: SecuritySettings,
    email_configured: bool,
}

impl<S, B> Service<ServiceRequest> for SessionGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_string);

        let service = self.service.clone();
        let pool = self.pool.clone();
        let security = self.security.clone();
        let email_configured = self.email_configured;

        Box::pin(async move {
            let raw = match bearer {
                Some(raw) => raw,
                None => {
                    tracing::warn!("Missing or malformed Authorization header");
                    return Err(reject(
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        "Missing or invalid authorization header",
                    ));
                }
            };

            let session = match Session::from_token(&raw, &security) {
                Ok(session) => session,
                Err(_) => {
                    return Err(reject(
                        StatusCode::UNAUTHORIZED,
                        "SESSION_INVALID",
                        "Invalid or expired session token",
                    ));
                }
            };

            // Refresh-on-verify: an unverified snapshot may be stale.
            let session = if !session.is_verified {
                match session.refresh(&pool).await {
                    Ok(fresh) => fresh,
                    Err(_) => {
                        return Err(reject(
                            StatusCode::UNAUTHORIZED,
                            "SESSION_INVALID",
                            "Invalid or expired session token",
                        ));
                    }
                }
            } else {
                session
            };

            if email_configured && !session.is_verified {
                tracing::debug!(account_id = %session.account_id, "Blocked: verification required");
                return Err(reject(
                    StatusCode::FORBIDDEN,
                    "VERIFY_REQUIRED",
                    "Please verify your email address to continue",
                ));
            }

            req.extensions_mut().insert(session);
            service.call(req).await
        })
    }
}

/// Build a rejection carrying the same structured body as `AppError`
/// responses, so clients parse one error shape everywhere.
fn reject(status: StatusCode, code: &str, message: &str) -> Error {
    let body = ErrorResponse::new(
        Uuid::new_v4().to_string(),
        message.to_string(),
        code.to_string(),
        status.as_u16(),
    );
    let response = HttpResponse::build(status).json(body);
    actix_web::error::InternalError::from_response("rejected", response).into()
}
