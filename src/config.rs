// Application configuration
// Loaded once from the environment at start-up and handed to the components that need it

use std::env;

/// Minimum HMAC key length accepted for token signing (128 bits)
const MIN_JWT_KEY_BYTES: usize = 16;

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_KEY must be at least 16 bytes long")]
    WeakSigningKey,
}

/// Token signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub key: String,
    pub expiry_minutes: i64,
}

/// Outbound vendor endpoints
///
/// Parsed so deployments keep one configuration surface; no client in this
/// service calls them yet.
#[derive(Debug, Clone, Default)]
pub struct ServiceUrls {
    pub short_link_api: Option<String>,
    pub send_sms_api: Option<String>,
    pub send_sms_api_enable: bool,
}

/// Immutable process-wide configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub service_urls: ServiceUrls,
}

impl AppConfig {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let key = lookup("JWT_KEY").ok_or(ConfigError::Missing("JWT_KEY"))?;
        if key.len() < MIN_JWT_KEY_BYTES {
            return Err(ConfigError::WeakSigningKey);
        }

        let config = Self {
            database_url,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", &lookup, 5)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", &lookup, 8080)?,
            jwt: JwtConfig {
                key,
                expiry_minutes: parse_or("JWT_EXPIRY_MINUTES", &lookup, 60)?,
            },
            service_urls: ServiceUrls {
                short_link_api: lookup("SHORT_LINK_API_URL"),
                send_sms_api: lookup("SEND_SMS_API_URL"),
                send_sms_api_enable: parse_or("SEND_SMS_API_ENABLE", &lookup, false)?,
            },
        };

        if config.jwt.expiry_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRY_MINUTES",
                value: config.jwt.expiry_minutes.to_string(),
            });
        }

        Ok(config)
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
