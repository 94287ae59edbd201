use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub auth_public_key: String, // Ed25519 public key (PEM) of the auth service
    pub auth_issuer: String,
    pub auth_audience: String,
    pub notify_url: Option<String>,
    pub notify_token: String,
    pub manage_url_base: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = |name: &'static str| env::var(name).map_err(|_| ConfigError::Missing(name));
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: port.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            auth_public_key: required("AUTH_PUBLIC_KEY")?,
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://auth.slot-engine.local".to_string()),
            auth_audience: env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "slot-engine".to_string()),
            notify_url: env::var("NOTIFY_URL").ok().filter(|url| !url.is_empty()),
            notify_token: env::var("NOTIFY_TOKEN").unwrap_or_default(),
            manage_url_base: env::var("MANAGE_URL_BASE")
                .unwrap_or_else(|_| "http://localhost:3000/api/v1/bookings/manage".to_string()),
        })
    }
}
