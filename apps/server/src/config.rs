//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! development defaults. Only the JWT secret default is dangerous in
//! production, and it says so.

use std::env;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// JWT signing secret
    pub jwt_secret: String,

    /// JWT token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Username for the bootstrapped admin account (first start only)
    pub admin_username: String,

    /// Password for the bootstrapped admin account (first start only)
    pub admin_password: String,

    /// Store name shown on emailed invoices
    pub store_name: String,

    /// SMTP settings; invoice email is disabled when absent
    pub smtp: Option<SmtpConfig>,
}

/// SMTP relay settings for invoice email.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = AppConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./minimart.db".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                // In production this MUST be set via environment variable
                .unwrap_or_else(|_| "minimart-dev-secret-change-in-production".to_string()),

            jwt_lifetime_secs: env::var("JWT_LIFETIME_SECS")
                .unwrap_or_else(|_| "604800".to_string()) // 7 days
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()))?,

            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),

            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),

            store_name: env::var("STORE_NAME").unwrap_or_else(|_| "Minimart".to_string()),

            smtp: SmtpConfig::from_env(),
        };

        Ok(config)
    }
}

impl SmtpConfig {
    /// Present only when all required SMTP variables are set.
    fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok()?;
        let username = env::var("SMTP_USERNAME").ok()?;
        let password = env::var("SMTP_PASSWORD").ok()?;
        let from_address = env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());

        Some(SmtpConfig {
            host,
            username,
            password,
            from_address,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
