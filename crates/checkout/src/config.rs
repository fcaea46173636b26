//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORCHARD_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `ORCHARD_DB_MAX_CONNECTIONS` - pool size (default: 10)

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Connection settings for the relational store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `PostgreSQL` database connection URL (contains password).
    pub database_url: SecretString,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl StoreConfig {
    /// Load configuration from the environment, reading `.env` if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = required("ORCHARD_DATABASE_URL")?;
        let max_connections = match std::env::var("ORCHARD_DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("ORCHARD_DB_MAX_CONNECTIONS".to_string(), raw)
            })?,
            Err(_) => 10,
        };

        Ok(Self {
            database_url: SecretString::from(database_url),
            max_connections,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}
