//! Runtime configuration read from the environment.
//!
//! Only `DATABASE_URL` is required. Everything else has a default:
//! - HOST / PORT: listen address (`0.0.0.0:5000`)
//! - APP_ENV: `production` hides internal error detail from clients
//! - DB_MAX_CONNECTIONS, DB_CONNECT_TIMEOUT_SECS: pool sizing and connect bound
//! - AUTH_VERIFY_TIMEOUT_MS: bound on each identity provider call
//! - FIREBASE_PROJECT_ID, FIREBASE_JWKS_URL: token verification

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub verify_timeout: Duration,
    pub firebase_project_id: Option<String>,
    pub jwks_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let environment = match var("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            environment,
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or("PORT", var("PORT"), 5000)?,
            },
            database: DatabaseConfig {
                url,
                max_connections: parse_or("DB_MAX_CONNECTIONS", var("DB_MAX_CONNECTIONS"), 10)?,
                connect_timeout: Duration::from_secs(parse_or(
                    "DB_CONNECT_TIMEOUT_SECS",
                    var("DB_CONNECT_TIMEOUT_SECS"),
                    5,
                )?),
            },
            auth: AuthConfig {
                verify_timeout: Duration::from_millis(parse_or(
                    "AUTH_VERIFY_TIMEOUT_MS",
                    var("AUTH_VERIFY_TIMEOUT_MS"),
                    5000,
                )?),
                firebase_project_id: var("FIREBASE_PROJECT_ID"),
                jwks_url: var("FIREBASE_JWKS_URL").unwrap_or_else(|| DEFAULT_JWKS_URL.to_string()),
            },
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}
