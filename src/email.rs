//! Outbound email capability.
//!
//! The orchestrator only sees the `EmailCapability` seam. `is_configured`
//! gates the auto-verify fallback on registration and the Verify-Required
//! gate; sends happen after the storage transaction committed and a failure
//! never rolls that state back.

use async_trait::async_trait;

use crate::configuration::EmailSettings;
use crate::error::EmailError;

#[async_trait]
pub trait EmailCapability: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn send_verification(&self, to: &str, token: &str) -> Result<(), EmailError>;

    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), EmailError>;
}

/// HTTP mail-API client.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    settings: EmailSettings,
}

#[derive(serde::Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: String,
}

impl EmailClient {
    pub fn new(settings: EmailSettings, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            settings,
        }
    }

    async fn deliver(&self, to: &str, subject: &str, html: String) -> Result<(), EmailError> {
        let url = format!("{}/email", self.settings.api_base_url);
        let request = SendEmailRequest {
            from: &self.settings.sender,
            to,
            subject,
            html,
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send email: {}", e);
                EmailError::SendFailed(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Email service returned error: {}", e);
                EmailError::SendFailed(e.to_string())
            })?;

        Ok(())
    }
}

#[async_trait]
impl EmailCapability for EmailClient {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send_verification(&self, to: &str, token: &str) -> Result<(), EmailError> {
        let link = format!("{}/?verify={}", self.settings.app_url, token);
        let html = format!(
            "<p>Welcome to Parkview!</p>\
             <p>Please <a href=\"{}\">verify your email address</a> to activate your account. \
             The link is valid for 24 hours.</p>",
            link
        );
        self.deliver(to, "Verify your email", html).await
    }

    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), EmailError> {
        let link = format!("{}/?reset={}", self.settings.app_url, token);
        let html = format!(
            "<p>We received a request to reset your password.</p>\
             <p><a href=\"{}\">Choose a new password</a>. The link is valid for 24 hours. \
             If you did not request this, you can ignore this email.</p>",
            link
        );
        self.deliver(to, "Reset your password", html).await
    }
}

/// Stand-in used when no email section is configured. Registration then
/// auto-verifies accounts and the verify/reset mail paths are not offered.
pub struct EmailDisabled;

#[async_trait]
impl EmailCapability for EmailDisabled {
    fn is_configured(&self) -> bool {
        false
    }

    async fn send_verification(&self, _to: &str, _token: &str) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured)
    }

    async fn send_password_reset(&self, _to: &str, _token: &str) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured)
    }
}
