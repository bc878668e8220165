use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub email: Option<EmailSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection pool settings, one named field per knob.
///
/// Earlier deployments tuned the pool differently per environment in copied
/// config blocks; every knob now lives here so the values cannot drift.
#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    /// SQLite URL, e.g. `sqlite://parkview.db`. `sqlite::memory:` works for tests.
    pub url: String,
    /// Connections kept in the pool.
    pub max_connections: u32,
    /// Seconds to wait for a free connection before giving up.
    pub acquire_timeout_secs: u64,
    /// Close connections idle longer than this many seconds.
    pub idle_timeout_secs: u64,
    /// Recycle connections older than this many seconds.
    pub max_lifetime_secs: u64,
    /// Ping a connection before handing it out.
    pub test_before_acquire: bool,
}

/// Credential and session-token policy.
#[derive(serde::Deserialize, Clone)]
pub struct SecuritySettings {
    pub session_secret: String,
    pub session_expiry_hours: i64,
    pub issuer: String,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
    /// Validity window for verification and reset tokens.
    pub token_expiry_hours: i64,
}

/// Outbound email transport. Absent section means the capability is not
/// configured: accounts are auto-verified and reset links cannot be sent.
#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    /// Base URL of the mail delivery API.
    pub api_base_url: String,
    pub sender: String,
    /// Public URL of the application, used to build verification/reset links.
    pub app_url: String,
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("database.url", "sqlite://parkview.db")?
        .set_default("database.max_connections", 5)?
        .set_default("database.acquire_timeout_secs", 30)?
        .set_default("database.idle_timeout_secs", 600)?
        .set_default("database.max_lifetime_secs", 1800)?
        .set_default("database.test_before_acquire", true)?
        .set_default("security.session_secret", "dev-secret-key-change-in-production")?
        .set_default("security.session_expiry_hours", 720)?
        .set_default("security.issuer", "parkview-auth")?
        .set_default("security.bcrypt_cost", 12)?
        .set_default("security.token_expiry_hours", 24)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_produce_a_complete_configuration() {
        let settings = get_configuration().expect("Failed to build configuration");

        assert_eq!(settings.security.bcrypt_cost, 12);
        assert_eq!(settings.security.token_expiry_hours, 24);
        assert_eq!(settings.database.max_connections, 5);
    }

    #[test]
    fn email_capability_is_unconfigured_by_default() {
        let settings = get_configuration().expect("Failed to build configuration");
        assert!(settings.email.is_none());
    }
}
