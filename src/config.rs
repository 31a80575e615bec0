//! Configuration loaded from environment variables.

use std::env;

use crate::PasswordHash;

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// The bcrypt cost used when hashing new passwords.
    pub bcrypt_cost: u32,
}

/// Errors that can occur while loading the configuration.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// An environment variable was set to a value that could not be parsed.
    #[error("invalid value for {0}")]
    InvalidValue(&'static str),
}

impl Config {
    /// Load the configuration from environment variables, reading a `.env`
    /// file first if one is present.
    ///
    /// `DATABASE_PATH` defaults to `gastos.db` and `BCRYPT_COST` to
    /// [PasswordHash::DEFAULT_COST].
    ///
    /// # Errors
    ///
    /// Returns a [ConfigError::InvalidValue] if `BCRYPT_COST` is set but is
    /// not a non-negative integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "gastos.db".to_string());

        let bcrypt_cost = match env::var("BCRYPT_COST") {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BCRYPT_COST"))?,
            Err(_) => PasswordHash::DEFAULT_COST,
        };

        Ok(Self {
            database_path,
            bcrypt_cost,
        })
    }
}
