use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is empty")]
    Missing(&'static str),
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Connection settings for the relational store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub port: i64,
    pub schema: String,
    pub max_connections: u32,
    pub timeout: Duration, // deadline applied to every store call
}

/// Signing key and session lifetime for issued tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub signing_key: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub server: ServerConfig,
}

impl DatabaseConfig {
    /// Validates every field and builds the driver connect options.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::Missing("user"));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing("password"));
        }
        if self.port <= 0 {
            return Err(ConfigError::Missing("port"));
        }
        let port = u16::try_from(self.port).map_err(|_| ConfigError::Invalid {
            field: "port",
            reason: format!("{} is out of range", self.port),
        })?;
        if self.schema.trim().is_empty() {
            return Err(ConfigError::Missing("schema"));
        }

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.schema))
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = DatabaseConfig {
            host: env_or("DB_HOST", ""),
            user: env_or("DB_USER", ""),
            password: env_or("DB_PASSWORD", ""),
            port: env_parse("DB_PORT", 0),
            schema: env_or("DB_SCHEMA", ""),
            max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            timeout: Duration::from_secs(env_parse("DB_TIMEOUT_SECS", 5)),
        };
        let security = SecurityConfig {
            signing_key: env_or("JWT_SECRET", ""),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
        };
        let server = ServerConfig {
            host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parse("APP_PORT", 8080),
        };
        Ok(Self {
            database,
            security,
            server,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, "unparsable environment value, using default");
            default
        }
    }
}
