use std::net::TcpListener;
use std::sync::Arc;

use parkview_auth::configuration::get_configuration;
use parkview_auth::email::{EmailCapability, EmailClient, EmailDisabled};
use parkview_auth::startup::run;
use parkview_auth::store::{connect_pool, init_schema};
use parkview_auth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting parkview-auth");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let pool = connect_pool(&configuration.database).await.map_err(|e| {
        tracing::error!("Failed to create connection pool: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database error")
    })?;

    init_schema(&pool).await.map_err(|e| {
        tracing::error!("Failed to initialize schema: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Schema error")
    })?;

    let mailer: Arc<dyn EmailCapability> = match configuration.email.clone() {
        Some(email_settings) => {
            tracing::info!("Email capability configured");
            Arc::new(EmailClient::new(email_settings, reqwest::Client::new()))
        }
        None => {
            tracing::info!("Email capability not configured; accounts will be auto-verified");
            Arc::new(EmailDisabled)
        }
    };

    let address = configuration.application.address();
    tracing::info!(address = %address, "Binding server");
    let listener = TcpListener::bind(&address)?;

    run(listener, pool, configuration.security, mailer)?.await
}
